use std::path::{Path, PathBuf};

/// Failures of worktree resolution and devcontainer session discovery.
///
/// None of these are retried; each carries enough context (name, path or the
/// raw line that failed to parse) to be reported as-is.
#[derive(Debug, thiserror::Error)]
pub(crate) enum WtError {
    #[error("invalid worktree name `{name}`: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("not in a git repository")]
    NotARepository,

    #[error("{reason} ({})", .root.display())]
    NotInNamedWorktree { reason: &'static str, root: PathBuf },

    #[error("no running devcontainer found for `{worktree}`")]
    NoRunningSession { worktree: String },

    #[error("no proxy port mapped for devcontainer `{worktree}`")]
    NoProxyMapping { worktree: String },

    #[error("failed to parse devcontainer up output `{line}`: {source}")]
    MalformedSessionOutput {
        line: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse port from `{line}`")]
    MalformedPortOutput { line: String },

    #[error("devcontainer up produced no JSON output")]
    NoStructuredOutput,

    #[error("`{program}` failed: {detail}")]
    Tool { program: String, detail: String },
}

impl WtError {
    pub(crate) fn tool(program: &str, detail: impl Into<String>) -> Self {
        Self::Tool {
            program: program.to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn no_session(worktree_path: &Path) -> Self {
        Self::NoRunningSession {
            worktree: display_name(worktree_path),
        }
    }

    pub(crate) fn no_proxy(worktree_path: &Path) -> Self {
        Self::NoProxyMapping {
            worktree: display_name(worktree_path),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
