use anyhow::{Context, Result, bail};
use std::io::{self, ErrorKind, Read, Write};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

pub(crate) struct CmdOutput {
    pub(crate) status: ExitStatus,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

fn command_in(program: &str, args: &[&str], cwd: Option<&Path>) -> Command {
    let mut command = Command::new(program);
    command.args(args);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }
    command
}

pub(crate) fn run_capture(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<CmdOutput> {
    let output = command_in(program, args, cwd)
        .output()
        .with_context(|| format!("failed to run `{program}`"))?;

    Ok(CmdOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Runs `program` attached to our terminal and fails on a non-zero exit.
pub(crate) fn run_stream(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<()> {
    let status = command_in(program, args, cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("failed to run `{program}`"))?;
    if !status.success() {
        bail!("`{program}` exited with status {status}");
    }
    Ok(())
}

/// Runs `program`, echoing its stdout to ours as it arrives while keeping a
/// copy. Stderr is passed through untouched.
pub(crate) fn run_tee(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<CmdOutput> {
    let mut child = command_in(program, args, cwd)
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("failed to run `{program}`"))?;

    let copied = match child.stdout.take() {
        Some(stdout) => tee(stdout, &mut io::stdout().lock()),
        None => Ok(Vec::new()),
    };
    let captured = match copied {
        Ok(captured) => captured,
        Err(err) => {
            if let Err(kill_err) = child.kill() {
                log::debug!("failed to kill `{program}`: {kill_err}");
            }
            child.wait().ok();
            return Err(err).with_context(|| format!("failed to read output of `{program}`"));
        }
    };
    let status = child
        .wait()
        .with_context(|| format!("failed to wait for `{program}`"))?;

    Ok(CmdOutput {
        status,
        stdout: String::from_utf8_lossy(&captured).into_owned(),
        stderr: String::new(),
    })
}

/// Copies `reader` into `terminal` chunk by chunk and returns the raw bytes.
/// Each chunk is flushed right away so partial progress lines show up.
pub(crate) fn tee<R: Read, W: Write>(mut reader: R, terminal: &mut W) -> io::Result<Vec<u8>> {
    let mut captured = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        let read = match reader.read(&mut chunk) {
            Ok(0) => return Ok(captured),
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        terminal.write_all(&chunk[..read])?;
        terminal.flush()?;
        captured.extend_from_slice(&chunk[..read]);
    }
}

/// Starts `program` without waiting for it. Output is discarded unless
/// `inherit_output` is set.
pub(crate) fn spawn_detached(program: &Path, args: &[String], inherit_output: bool) -> Result<()> {
    let output = || {
        if inherit_output {
            Stdio::inherit()
        } else {
            Stdio::null()
        }
    };
    Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(output())
        .stderr(output())
        .spawn()
        .with_context(|| format!("failed to launch `{}`", program.display()))?;
    Ok(())
}

/// The most useful line of a tool's stderr: the first `error:` line if there
/// is one, otherwise the last non-empty line.
pub(crate) fn best_error_line(stderr: &str) -> String {
    let lines = || stderr.lines().map(str::trim).filter(|line| !line.is_empty());
    lines()
        .find(|line| line.to_ascii_lowercase().starts_with("error:"))
        .or_else(|| lines().last())
        .unwrap_or("unknown error")
        .to_string()
}

pub(crate) fn path_to_str(path: &Path) -> Result<&str> {
    path.to_str()
        .with_context(|| format!("path is not valid UTF-8: {}", path.display()))
}
