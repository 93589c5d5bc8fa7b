use crate::error::WtError;
use crate::process::{CmdOutput, best_error_line, path_to_str, run_capture, run_stream};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Read-only view of the repository's worktree registry.
pub(crate) trait Vcs {
    /// Absolute path of the shared `.git` directory.
    fn common_dir(&self) -> Result<PathBuf, WtError>;
    /// Top-level directory of the checkout the caller is in.
    fn show_toplevel(&self) -> Result<PathBuf, WtError>;
    /// Registered worktree paths, in git's listing order.
    fn list_worktrees(&self) -> Result<Vec<PathBuf>, WtError>;
}

#[derive(Debug, Clone)]
pub(crate) struct GitCli {
    bin: String,
    cwd: Option<PathBuf>,
}

impl GitCli {
    pub(crate) fn new(bin: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            cwd: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn in_dir(bin: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            cwd: Some(cwd.into()),
        }
    }

    fn capture(&self, args: &[&str]) -> Result<CmdOutput, WtError> {
        run_capture(&self.bin, args, self.cwd.as_deref())
            .map_err(|err| WtError::tool(&self.bin, format!("{err:#}")))
    }

    fn rev_parse_path(&self, flag: &str) -> Result<PathBuf, WtError> {
        let output = self.capture(&["rev-parse", "--path-format=absolute", flag])?;
        if !output.status.success() {
            log::debug!(
                "git rev-parse {flag} failed: {}",
                best_error_line(&output.stderr)
            );
            return Err(WtError::NotARepository);
        }
        let path = output.stdout.trim();
        if path.is_empty() {
            return Err(WtError::NotARepository);
        }
        Ok(PathBuf::from(path))
    }

    pub(crate) fn set_relative_paths(&self) -> bool {
        self.capture(&["config", "worktree.useRelativePaths", "true"])
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    pub(crate) fn has_origin(&self) -> bool {
        self.capture(&["remote", "get-url", "origin"])
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    pub(crate) fn fetch_origin(&self) -> Result<()> {
        run_stream(&self.bin, &["fetch", "origin"], self.cwd.as_deref())
    }

    pub(crate) fn add_detached_worktree(&self, path: &Path) -> Result<()> {
        let path_str = path_to_str(path)?;
        run_stream(
            &self.bin,
            &["worktree", "add", "--detach", path_str, "HEAD"],
            self.cwd.as_deref(),
        )
        .context("git worktree add failed")
    }

    pub(crate) fn remove_worktree(&self, path: &Path, extra: &[String]) -> Result<()> {
        let mut args = vec!["worktree", "remove", path_to_str(path)?];
        args.extend(extra.iter().map(String::as_str));
        run_stream(&self.bin, &args, self.cwd.as_deref())
    }
}

impl Vcs for GitCli {
    fn common_dir(&self) -> Result<PathBuf, WtError> {
        self.rev_parse_path("--git-common-dir")
    }

    fn show_toplevel(&self) -> Result<PathBuf, WtError> {
        self.rev_parse_path("--show-toplevel")
    }

    fn list_worktrees(&self) -> Result<Vec<PathBuf>, WtError> {
        let output = self.capture(&["worktree", "list", "--porcelain"])?;
        if !output.status.success() {
            return Err(WtError::tool(
                "git worktree list",
                best_error_line(&output.stderr),
            ));
        }
        Ok(parse_git_worktree_porcelain(&output.stdout))
    }
}

/// The project root is the directory holding the common `.git` directory.
pub(crate) fn project_root_from_common_dir(common_dir: &Path) -> Option<PathBuf> {
    let parent = common_dir.parent()?;
    if parent.as_os_str().is_empty() {
        return None;
    }
    Some(parent.to_path_buf())
}

pub(crate) fn parse_git_worktree_porcelain(raw: &str) -> Vec<PathBuf> {
    raw.lines()
        .filter_map(|line| line.strip_prefix("worktree "))
        .map(str::trim)
        .filter(|path| !path.is_empty())
        .map(PathBuf::from)
        .collect()
}
