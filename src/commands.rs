use crate::action::{Action, ExecSpec};
use crate::attach::{DevcontainerCli, discover_session};
use crate::browser::{chrome_args, curl_args, find_chrome, playwright_args};
use crate::cli::Commands;
use crate::complete::write_registration;
use crate::config::Config;
use crate::constants::{
    CHROME_PROFILE_DIR, DEFAULT_EXEC_SHELL_CMD, DEVCONTAINER_CONFIG, DEVCONTAINER_DIR,
};
use crate::git::GitCli;
use crate::locator::WorktreeLocator;
use crate::naming::NameCodec;
use crate::net::normalize_localhost_args;
use crate::process::{path_to_str, run_stream, spawn_detached};
use crate::resolve::WorkspaceFolder;
use crate::runtime::DockerCli;
use crate::session::SessionDiscovery;
use crate::shell::{parent_shell, shell_join, shell_quote};
use crate::ui::{confirm, progress, verbose_enabled};
use crate::vscode::attach_args_for_worktree;
use anyhow::{Context, Result, bail};
use std::env;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const DEVCONTAINER_TEMPLATES: &[(&str, &str)] = &[
    (
        "devcontainer.json",
        include_str!("../templates/devcontainer/devcontainer.json"),
    ),
    (
        "Dockerfile",
        include_str!("../templates/devcontainer/Dockerfile"),
    ),
    (
        "supervisord.conf",
        include_str!("../templates/devcontainer/supervisord.conf"),
    ),
];
const PROXY_PORT_PLACEHOLDER: &str = "{{PROXY_PORT}}";

/// Collaborators every command resolves against, built once from config.
pub(crate) struct App {
    config: Config,
    locator: WorktreeLocator<GitCli>,
    docker: DockerCli,
    devcontainer: DevcontainerCli,
}

impl App {
    pub(crate) fn new(config: Config) -> Self {
        let locator = WorktreeLocator::new(
            GitCli::new(&config.git_bin),
            NameCodec::new(&config.delimiter),
        );
        let docker = DockerCli::new(&config.docker_bin);
        let devcontainer = DevcontainerCli::new(&config.devcontainer_bin);
        Self {
            config,
            locator,
            docker,
            devcontainer,
        }
    }

    fn git(&self) -> &GitCli {
        self.locator.vcs()
    }

    fn sessions(&self) -> SessionDiscovery<'_, DockerCli> {
        SessionDiscovery::new(&self.docker, self.config.proxy_port)
    }

    fn workspace_folder(&self, args: &[String]) -> Result<WorkspaceFolder> {
        Ok(self.locator.resolve_workspace_folder(args)?)
    }

    fn proxy_port(&self, dir: &Path) -> Result<u16> {
        Ok(self.sessions().proxy_port(dir)?)
    }
}

pub(crate) fn run(command: Commands, config: Config) -> Result<Action> {
    let app = App::new(config);
    match command {
        Commands::Add { name } => cmd_add(&app, &name),
        Commands::Ls => cmd_ls(&app),
        Commands::Rm { name, git_args } => cmd_rm(&app, &name, &git_args),
        Commands::Cd { name, create } => cmd_cd(&app, name.as_deref(), create),
        Commands::Code { name, create } => cmd_code(&app, name.as_deref(), create),
        Commands::Chrome { args } => cmd_chrome(&app, &args),
        Commands::Playwright { args } => cmd_playwright(&app, &args),
        Commands::Curl { args } => cmd_curl(&app, &args),
        Commands::Name => cmd_name(&app),
        Commands::Dir => cmd_dir(&app),
        Commands::Exec { args } => cmd_exec(&app, &args),
        Commands::Up { args } => cmd_devcontainer(&app, "up", &args),
        Commands::Build { args } => cmd_devcontainer(&app, "build", &args),
        Commands::Down { name } => cmd_down(&app, name.as_deref()),
        Commands::ProxyPort { name } => cmd_proxy_port(&app, name.as_deref()),
        Commands::Init { force } => cmd_init(&app.config, force),
        Commands::Completion { shell } => cmd_completion(shell),
        Commands::CompleteWorktrees { prefix } => cmd_complete_worktrees(&app, &prefix),
    }
}

fn cmd_add(app: &App, name: &str) -> Result<Action> {
    let worktree_path = add_worktree(app, name)?;
    println!("{}", worktree_path.display());
    Ok(Action::success())
}

fn add_worktree(app: &App, name: &str) -> Result<PathBuf> {
    progress(&format!("add: creating worktree `{name}`"));
    let worktree_path = app.locator.resolve_path(name)?;
    ensure_target_free(&worktree_path)?;

    let source_dir = match app.locator.current_worktree_root() {
        Ok(root) => root,
        Err(_) => env::current_dir().context("failed to read current directory")?,
    };

    let git = app.git();
    if !git.set_relative_paths() {
        log::debug!("could not enable worktree.useRelativePaths");
    }
    if git.has_origin() {
        if let Err(err) = git.fetch_origin() {
            log::warn!("git fetch origin failed: {err:#}");
        }
    } else {
        log::warn!("git remote 'origin' not configured; skipping fetch");
    }

    git.add_detached_worktree(&worktree_path)?;
    scaffold_worktree_env(&source_dir, &worktree_path, name);
    Ok(worktree_path)
}

pub(crate) fn ensure_target_free(worktree_path: &Path) -> Result<()> {
    let Ok(metadata) = fs::metadata(worktree_path) else {
        return Ok(());
    };
    let dir_name = worktree_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| worktree_path.display().to_string());
    if !metadata.is_dir() {
        bail!("'{dir_name}' already exists as a file; choose a different name or remove it first");
    }
    if worktree_path.join(".git").exists() {
        bail!(
            "'{dir_name}' already exists with a .git entry; choose a different name or remove it first"
        );
    }
    bail!(
        "'{dir_name}' already exists but is not a git worktree; choose a different name or remove it first"
    )
}

/// Carries local env files into a fresh worktree. Every step is best effort.
pub(crate) fn scaffold_worktree_env(source_dir: &Path, worktree_path: &Path, name: &str) {
    copy_if_present(&source_dir.join(".env"), &worktree_path.join(".env"));

    let envrc = worktree_path.join(".envrc");
    if copy_if_present(&source_dir.join(".envrc"), &envrc)
        && let Err(err) = run_stream("direnv", &["allow"], Some(worktree_path))
    {
        log::debug!("direnv allow skipped: {err:#}");
    }

    let devcontainer_dir = worktree_path.join(DEVCONTAINER_DIR);
    if !devcontainer_dir.is_dir() {
        return;
    }
    let dev_env = devcontainer_dir.join(".env");
    copy_if_present(&source_dir.join(DEVCONTAINER_DIR).join(".env"), &dev_env);
    let appended = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&dev_env)
        .and_then(|mut file| writeln!(file, "GIT_WORKTREE={name}"));
    if let Err(err) = appended {
        log::warn!("failed to write {}: {err}", dev_env.display());
    }
}

fn copy_if_present(src: &Path, dst: &Path) -> bool {
    if !src.exists() {
        return false;
    }
    match fs::copy(src, dst) {
        Ok(_) => true,
        Err(err) => {
            log::warn!("failed to copy {}: {err}", src.display());
            false
        }
    }
}

fn cmd_ls(app: &App) -> Result<Action> {
    for name in app.locator.enumerate("")? {
        println!("{name}");
    }
    Ok(Action::success())
}

fn cmd_rm(app: &App, name: &str, git_args: &[String]) -> Result<Action> {
    let name = app.locator.resolve_name_arg(name)?;
    let worktree_path = app.locator.resolve_path(&name)?;
    progress(&format!("rm: removing worktree at {}", worktree_path.display()));
    app.git().remove_worktree(&worktree_path, git_args)?;

    // git leaves untracked leftovers such as editor profiles behind.
    if worktree_path.exists()
        && let Err(err) = fs::remove_dir_all(&worktree_path)
    {
        log::warn!("failed to remove {}: {err}", worktree_path.display());
    }
    Ok(Action::success())
}

/// Directory for `cd`/`code`: the project root without a name, otherwise the
/// named worktree, created on request or after confirmation.
fn resolve_worktree_dir(app: &App, name: Option<&str>, create: bool) -> Result<PathBuf> {
    let Some(name) = name else {
        return Ok(app.locator.project_root()?);
    };
    let name = app.locator.resolve_name_arg(name)?;
    let dir = app.locator.resolve_path(&name)?;
    if !dir.exists() {
        if !create && !confirm(&format!("Worktree '{name}' doesn't exist. Create it now?")) {
            bail!("aborted");
        }
        add_worktree(app, &name)?;
    }
    Ok(dir)
}

fn cmd_cd(app: &App, name: Option<&str>, create: bool) -> Result<Action> {
    let dir = resolve_worktree_dir(app, name, create)?;
    Ok(shell_in_dir(&dir))
}

fn shell_in_dir(dir: &Path) -> Action {
    ExecSpec::new(parent_shell(), Vec::new()).in_dir(dir).into()
}

fn has_devcontainer_config(dir: &Path) -> bool {
    dir.join(DEVCONTAINER_DIR)
        .join(DEVCONTAINER_CONFIG)
        .exists()
}

fn cmd_code(app: &App, name: Option<&str>, create: bool) -> Result<Action> {
    let dir = resolve_worktree_dir(app, name, create)?;
    if has_devcontainer_config(&dir) && app.devcontainer.available() {
        return open_devcontainer(app, &dir);
    }
    Ok(ExecSpec::new(&app.config.code_bin, vec![path_to_str(&dir)?.to_string()]).into())
}

fn open_devcontainer(app: &App, dir: &Path) -> Result<Action> {
    progress(&format!("code: starting devcontainer for {}", dir.display()));
    let session = discover_session(&app.devcontainer, dir)?;
    let proxy_port = match app.sessions().proxy_port(dir) {
        Ok(port) => Some(port),
        Err(err) => {
            log::debug!("opening without proxy: {err}");
            None
        }
    };
    let args = attach_args_for_worktree(dir, &session, proxy_port);
    Ok(ExecSpec::new(&app.config.code_bin, args).into())
}

/// Drops the `--` that separates a worktree reference from its payload.
pub(crate) fn strip_separator(payload: &[String]) -> &[String] {
    match payload.split_first() {
        Some((first, rest)) if first == "--" => rest,
        _ => payload,
    }
}

fn log_launch(label: &str, program: &Path, args: &[String]) {
    log::info!(
        "Launching {label}: {} {}",
        shell_quote(&program.display().to_string()),
        shell_join(args)
    );
}

fn cmd_chrome(app: &App, args: &[String]) -> Result<Action> {
    let folder = app.workspace_folder(args)?;
    let chrome = find_chrome()?;

    let profile_dir = folder.path.join(CHROME_PROFILE_DIR);
    fs::create_dir_all(&profile_dir).context("failed to create Chrome profile directory")?;

    let port = app.proxy_port(&folder.path)?;
    let extra = normalize_localhost_args(strip_separator(&folder.payload));
    let chrome_args = chrome_args(&profile_dir, port, &extra);

    log_launch("Chrome", &chrome, &chrome_args);
    spawn_detached(&chrome, &chrome_args, verbose_enabled())?;
    Ok(Action::success())
}

fn cmd_playwright(app: &App, args: &[String]) -> Result<Action> {
    let folder = app.workspace_folder(args)?;
    let npx = which::which("npx").context("could not find npx; install Node.js and Playwright")?;

    let port = app.proxy_port(&folder.path)?;
    let extra = normalize_localhost_args(strip_separator(&folder.payload));
    let playwright_args = playwright_args(port, &extra);

    log_launch("Playwright", &npx, &playwright_args);
    spawn_detached(&npx, &playwright_args, verbose_enabled())?;
    Ok(Action::success())
}

fn cmd_curl(app: &App, args: &[String]) -> Result<Action> {
    let folder = app.workspace_folder(args)?;
    let curl = which::which("curl").context("could not find curl; install curl first")?;

    let port = app.proxy_port(&folder.path)?;
    let extra = normalize_localhost_args(strip_separator(&folder.payload));
    let curl_args = curl_args(port, &extra);

    log_launch("curl", &curl, &curl_args);
    Ok(ExecSpec::new(path_to_str(&curl)?, curl_args).into())
}

fn cmd_name(app: &App) -> Result<Action> {
    println!("{}", app.locator.current_worktree_name()?);
    Ok(Action::success())
}

fn cmd_dir(app: &App) -> Result<Action> {
    println!("{}", app.locator.current_worktree_root()?.display());
    Ok(Action::success())
}

fn cmd_exec(app: &App, args: &[String]) -> Result<Action> {
    let folder = app.workspace_folder(args)?;
    let command = strip_separator(&folder.payload);

    if has_devcontainer_config(&folder.path) {
        let mut dc_args = vec![
            "exec".to_string(),
            "--workspace-folder".to_string(),
            path_to_str(&folder.path)?.to_string(),
        ];
        if command.is_empty() {
            dc_args.extend(DEFAULT_EXEC_SHELL_CMD.iter().map(|arg| arg.to_string()));
        } else {
            dc_args.extend_from_slice(command);
        }
        return Ok(ExecSpec::new(app.devcontainer.bin(), dc_args)
            .with_env("DOCKER_CLI_HINTS", "false")
            .into());
    }

    let Some((program, rest)) = command.split_first() else {
        return Ok(shell_in_dir(&folder.path));
    };
    Ok(ExecSpec::new(program, rest.to_vec())
        .in_dir(&folder.path)
        .into())
}

fn cmd_devcontainer(app: &App, subcommand: &str, args: &[String]) -> Result<Action> {
    let folder = app.workspace_folder(args)?;
    let mut dc_args = vec![
        subcommand.to_string(),
        "--workspace-folder".to_string(),
        path_to_str(&folder.path)?.to_string(),
    ];
    dc_args.extend(folder.payload);
    Ok(ExecSpec::new(app.devcontainer.bin(), dc_args).into())
}

fn cmd_down(app: &App, name: Option<&str>) -> Result<Action> {
    let args: Vec<String> = name.map(str::to_string).into_iter().collect();
    let folder = app.workspace_folder(&args)?;
    let container_id = app.sessions().find_container(&folder.path, true)?;
    log::info!("Removing container {container_id}");
    app.docker.remove(&container_id)?;
    Ok(Action::success())
}

fn cmd_proxy_port(app: &App, name: Option<&str>) -> Result<Action> {
    let args: Vec<String> = name.map(str::to_string).into_iter().collect();
    let folder = app.workspace_folder(&args)?;
    println!("{}", app.proxy_port(&folder.path)?);
    Ok(Action::success())
}

fn cmd_init(config: &Config, force: bool) -> Result<Action> {
    let cwd = env::current_dir().context("failed to get current directory")?;
    write_devcontainer_templates(&cwd, config.proxy_port, force)?;
    println!("Created .devcontainer/ in {}", cwd.display());
    Ok(Action::success())
}

pub(crate) fn write_devcontainer_templates(dir: &Path, proxy_port: u16, force: bool) -> Result<()> {
    let devcontainer_dir = dir.join(DEVCONTAINER_DIR);
    if devcontainer_dir.is_dir() {
        if !force {
            bail!(".devcontainer/ already exists; use --force to overwrite");
        }
        log::info!("Overwriting existing .devcontainer/ directory");
    }
    fs::create_dir_all(&devcontainer_dir).context("failed to create .devcontainer/")?;

    let port = proxy_port.to_string();
    for (name, template) in DEVCONTAINER_TEMPLATES {
        log::info!("Writing .devcontainer/{name}");
        let content = template.replace(PROXY_PORT_PLACEHOLDER, &port);
        fs::write(devcontainer_dir.join(name), content)
            .with_context(|| format!("failed to write {name}"))?;
    }
    Ok(())
}

fn cmd_completion(shell: clap_complete::Shell) -> Result<Action> {
    write_registration(shell, &mut std::io::stdout())?;
    Ok(Action::success())
}

fn cmd_complete_worktrees(app: &App, prefix: &str) -> Result<Action> {
    // Completion must stay silent outside a repository.
    for name in app.locator.enumerate(prefix).unwrap_or_default() {
        println!("{name}");
    }
    Ok(Action::success())
}
