use crate::config::Config;
use crate::git::{GitCli, Vcs};
use crate::locator::WorktreeLocator;
use crate::naming::NameCodec;
use anyhow::{Context, Result};
use clap_complete::Shell;
use clap_complete::engine::{ArgValueCompleter, CompletionCandidate};
use clap_complete::env::Shells;
use std::ffi::OsStr;
use std::io::Write;

/// Set by the registration scripts when the shell asks `wt` for candidates.
pub(crate) const COMPLETE_ENV_VAR: &str = "COMPLETE";
const BIN_NAME: &str = "wt";

/// Completes registered worktree names for name and payload positions.
pub(crate) fn worktree_name_completer() -> ArgValueCompleter {
    ArgValueCompleter::new(complete_worktree_names)
}

fn complete_worktree_names(current: &OsStr) -> Vec<CompletionCandidate> {
    let config = Config::load().unwrap_or_default();
    let locator = WorktreeLocator::new(
        GitCli::new(&config.git_bin),
        NameCodec::new(&config.delimiter),
    );
    worktree_candidates(&locator, current)
}

/// Completion must stay silent outside a repository, so lookup failures
/// yield no candidates.
pub(crate) fn worktree_candidates<V: Vcs>(
    locator: &WorktreeLocator<V>,
    current: &OsStr,
) -> Vec<CompletionCandidate> {
    let Some(prefix) = current.to_str() else {
        return Vec::new();
    };
    match locator.enumerate(prefix) {
        Ok(names) => names.into_iter().map(CompletionCandidate::new).collect(),
        Err(err) => {
            log::debug!("no worktree candidates: {err}");
            Vec::new()
        }
    }
}

/// Shell snippet that routes completion requests back to `wt`.
pub(crate) fn write_registration(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let name = shell.to_string();
    let shells = Shells::builtins();
    let completer = shells
        .completer(&name)
        .with_context(|| format!("dynamic completion is not available for {name}"))?;
    completer
        .write_registration(COMPLETE_ENV_VAR, BIN_NAME, BIN_NAME, BIN_NAME, out)
        .with_context(|| format!("failed to write {name} completion script"))?;
    Ok(())
}
