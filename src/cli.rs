use crate::complete::worktree_name_completer;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "wt",
    version,
    about = "Git worktree manager for sibling worktrees (repo@name) and their devcontainers"
)]
pub(crate) struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub(crate) verbose: bool,
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Create a new worktree next to the main repo (e.g. repo@name).
    Add { name: String },
    /// List all sibling worktrees.
    #[command(alias = "list")]
    Ls,
    /// Remove a worktree. Extra arguments go to `git worktree remove`.
    #[command(alias = "remove")]
    Rm {
        /// Worktree name, or `.` for the current worktree.
        #[arg(add = worktree_name_completer())]
        name: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        git_args: Vec<String>,
    },
    /// Open a new shell in the worktree directory.
    Cd {
        /// Worktree name. Without one, the main repo root is used.
        #[arg(add = worktree_name_completer())]
        name: Option<String>,
        /// Create the worktree if it doesn't exist.
        #[arg(short, long)]
        create: bool,
    },
    /// Open the worktree in VS Code, attached to its devcontainer if it has one.
    Code {
        /// Worktree name. Without one, the main repo root is used.
        #[arg(add = worktree_name_completer())]
        name: Option<String>,
        /// Create the worktree if it doesn't exist.
        #[arg(short, long)]
        create: bool,
    },
    /// Open Chrome with a per-worktree profile routed through the devcontainer proxy.
    Chrome {
        /// `[name] [-- chrome-args...]`
        #[arg(
            trailing_var_arg = true,
            allow_hyphen_values = true,
            add = worktree_name_completer()
        )]
        args: Vec<String>,
    },
    /// Open a Playwright browser routed through the devcontainer proxy.
    Playwright {
        /// `[name] [-- playwright-args...]`
        #[arg(
            trailing_var_arg = true,
            allow_hyphen_values = true,
            add = worktree_name_completer()
        )]
        args: Vec<String>,
    },
    /// Run curl through the devcontainer proxy.
    Curl {
        /// `[name] [-- curl-args...]`
        #[arg(
            trailing_var_arg = true,
            allow_hyphen_values = true,
            add = worktree_name_completer()
        )]
        args: Vec<String>,
    },
    /// Print the name of the current worktree.
    Name,
    /// Print the root directory of the current worktree or git project.
    Dir,
    /// Execute a command in the worktree's devcontainer (default: current worktree).
    Exec {
        /// `[name] [--] <command> [args...]`
        #[arg(
            trailing_var_arg = true,
            allow_hyphen_values = true,
            add = worktree_name_completer()
        )]
        args: Vec<String>,
    },
    /// Start the worktree's devcontainer (default: current worktree).
    Up {
        /// `[name] [devcontainer-args...]`
        #[arg(
            trailing_var_arg = true,
            allow_hyphen_values = true,
            add = worktree_name_completer()
        )]
        args: Vec<String>,
    },
    /// Stop and remove the devcontainer for a worktree.
    Down {
        #[arg(add = worktree_name_completer())]
        name: Option<String>,
    },
    /// Build the worktree's devcontainer (default: current worktree).
    Build {
        /// `[name] [devcontainer-args...]`
        #[arg(
            trailing_var_arg = true,
            allow_hyphen_values = true,
            add = worktree_name_completer()
        )]
        args: Vec<String>,
    },
    /// Print the SOCKS proxy port for the worktree's devcontainer.
    ProxyPort {
        #[arg(add = worktree_name_completer())]
        name: Option<String>,
    },
    /// Create a minimal .devcontainer/ with SOCKS5 proxy support.
    Init {
        /// Overwrite existing .devcontainer/ files.
        #[arg(long)]
        force: bool,
    },
    /// Generate shell completion scripts.
    Completion { shell: clap_complete::Shell },
    /// Print worktree names starting with a prefix.
    #[command(hide = true)]
    CompleteWorktrees {
        #[arg(default_value = "")]
        prefix: String,
    },
}
