pub(crate) const DEFAULT_DELIMITER: &str = "@";
pub(crate) const DEFAULT_PROXY_PORT: u16 = 1080;
pub(crate) const DEFAULT_GIT_BIN: &str = "git";
pub(crate) const DEFAULT_DOCKER_BIN: &str = "docker";
pub(crate) const DEFAULT_DEVCONTAINER_BIN: &str = "devcontainer";
pub(crate) const DEFAULT_CODE_BIN: &str = "code";
pub(crate) const DEFAULT_SHELL: &str = "/bin/sh";

pub(crate) const CURRENT_WORKTREE_MARKER: &str = ".";

pub(crate) const DEVCONTAINER_LABEL: &str = "devcontainer.local_folder";
pub(crate) const DEVCONTAINER_DIR: &str = ".devcontainer";
pub(crate) const DEVCONTAINER_CONFIG: &str = "devcontainer.json";

pub(crate) const ATTACHED_CONTAINER_SCHEME: &str = "vscode-remote";
pub(crate) const ATTACHED_CONTAINER_HANDLER: &str = "attached-container";

pub(crate) const LOOPBACK_HOSTNAME: &str = "localhost";
pub(crate) const LOOPBACK_ADDR: &str = "127.0.0.1";

pub(crate) const VSCODE_PROFILE_DIR: &str = ".vscode-profile";
pub(crate) const CHROME_PROFILE_DIR: &str = ".chrome-profile";

pub(crate) const DEFAULT_EXEC_SHELL_CMD: &[&str] = &[
    "/bin/sh",
    "-c",
    "command -v bash >/dev/null 2>&1 && exec bash || exec sh",
];
