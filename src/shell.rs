use crate::constants::DEFAULT_SHELL;
use crate::process::run_capture;
use std::env;

/// Shell that launched us, so `wt cd` drops the user back into the same kind
/// of shell. Falls back to `$SHELL`, then `/bin/sh`.
pub(crate) fn parent_shell() -> String {
    parent_process_command()
        .or_else(|| {
            env::var("SHELL")
                .ok()
                .filter(|value| !value.trim().is_empty())
        })
        .unwrap_or_else(|| DEFAULT_SHELL.to_string())
}

#[cfg(unix)]
fn parent_process_command() -> Option<String> {
    let ppid = std::os::unix::process::parent_id().to_string();
    let output = run_capture("ps", &["-p", &ppid, "-o", "comm="], None).ok()?;
    if !output.status.success() {
        return None;
    }
    normalize_process_command(&output.stdout)
}

#[cfg(not(unix))]
fn parent_process_command() -> Option<String> {
    None
}

/// Login shells show up as `-zsh` / `-bash`.
pub(crate) fn normalize_process_command(raw: &str) -> Option<String> {
    let command = raw.trim();
    let command = command.strip_prefix('-').unwrap_or(command);
    if command.is_empty() {
        return None;
    }
    Some(command.to_string())
}

pub(crate) fn shell_join(args: &[String]) -> String {
    args.iter()
        .map(|arg| shell_quote(arg))
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn shell_quote(value: &str) -> String {
    if value.is_empty() {
        return "''".to_string();
    }
    if value
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || "@%_+=:,./-".contains(ch))
    {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', "'\"'\"'"))
}
