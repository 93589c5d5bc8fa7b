use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

/// What a command handler asks `main` to do once it is done resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    Exit(i32),
    /// Replace this process with another program.
    Exec(ExecSpec),
}

impl Action {
    pub(crate) fn success() -> Self {
        Self::Exit(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ExecSpec {
    pub(crate) program: String,
    pub(crate) args: Vec<String>,
    pub(crate) cwd: Option<PathBuf>,
    pub(crate) env: Vec<(String, String)>,
}

impl ExecSpec {
    pub(crate) fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: None,
            env: Vec::new(),
        }
    }

    pub(crate) fn in_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    pub(crate) fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }
}

impl From<ExecSpec> for Action {
    fn from(spec: ExecSpec) -> Self {
        Self::Exec(spec)
    }
}

/// Carries out `action`, returning the exit code for the current process.
/// A successful `Exec` on unix never returns.
pub(crate) fn perform(action: Action) -> Result<i32> {
    let spec = match action {
        Action::Exit(code) => return Ok(code),
        Action::Exec(spec) => spec,
    };

    let search_dir = match &spec.cwd {
        Some(dir) => dir.clone(),
        None => env::current_dir().context("failed to read current directory")?,
    };
    let program = which::which_in(&spec.program, env::var_os("PATH"), &search_dir)
        .with_context(|| format!("failed to find `{}`", spec.program))?;
    log::debug!("exec {} {:?}", program.display(), spec.args);

    let mut command = Command::new(&program);
    command.args(&spec.args);
    if let Some(cwd) = &spec.cwd {
        command.current_dir(cwd);
    }
    command.envs(spec.env.iter().map(|(key, value)| (key, value)));

    replace_process(command, &spec.program)
}

#[cfg(unix)]
fn replace_process(mut command: Command, name: &str) -> Result<i32> {
    use std::os::unix::process::CommandExt;

    let err = command.exec();
    Err(err).with_context(|| format!("failed to exec `{name}`"))
}

#[cfg(not(unix))]
fn replace_process(mut command: Command, name: &str) -> Result<i32> {
    let status = command
        .status()
        .with_context(|| format!("failed to run `{name}`"))?;
    Ok(status.code().unwrap_or(1))
}
