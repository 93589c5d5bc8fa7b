use crate::action::{Action, ExecSpec, perform};
use crate::attach::{
    Devcontainer, SessionDescriptor, attached_container_uri, discover_session, last_json_line,
    parse_up_transcript,
};
use crate::browser::{chrome_args, curl_args, playwright_args};
use crate::cli::{Cli, Commands};
use crate::commands::{
    ensure_target_free, scaffold_worktree_env, strip_separator, write_devcontainer_templates,
};
use crate::complete::{worktree_candidates, write_registration};
use crate::config::Config;
use crate::error::WtError;
use crate::git::{GitCli, Vcs, parse_git_worktree_porcelain, project_root_from_common_dir};
use crate::locator::WorktreeLocator;
use crate::naming::{NameCodec, validate_worktree_name};
use crate::net::{ProxyScheme, normalize_localhost_url, proxy_url};
use crate::process::{best_error_line, run_capture, run_tee, tee};
use crate::resolve::{WorkspaceFolder, WorktreeArgs};
use crate::runtime::ContainerRuntime;
use crate::session::{
    SessionDiscovery, container_label, parse_container_id, parse_published_port,
};
use crate::shell::{normalize_process_command, shell_join, shell_quote};
use crate::ui::is_affirmative;
use crate::vscode::attach_args;
use clap::Parser;
use std::cell::RefCell;
use std::ffi::OsStr;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct FakeVcs {
    common_dir: Option<PathBuf>,
    toplevel: Option<PathBuf>,
    worktrees: Vec<PathBuf>,
}

impl Vcs for FakeVcs {
    fn common_dir(&self) -> Result<PathBuf, WtError> {
        self.common_dir.clone().ok_or(WtError::NotARepository)
    }

    fn show_toplevel(&self) -> Result<PathBuf, WtError> {
        self.toplevel.clone().ok_or(WtError::NotARepository)
    }

    fn list_worktrees(&self) -> Result<Vec<PathBuf>, WtError> {
        Ok(self.worktrees.clone())
    }
}

/// Project `/work/repo` with sibling worktrees `alpha` and `beta`, plus
/// registered worktrees that do not follow the sibling layout.
fn fake_locator(current: &str) -> WorktreeLocator<FakeVcs> {
    let vcs = FakeVcs {
        common_dir: Some(PathBuf::from("/work/repo/.git")),
        toplevel: Some(PathBuf::from(current)),
        worktrees: vec![
            PathBuf::from("/work/repo"),
            PathBuf::from("/work/repo@alpha"),
            PathBuf::from("/elsewhere/repo@gamma"),
            PathBuf::from("/work/other@delta"),
            PathBuf::from("/work/repo@beta"),
        ],
    };
    WorktreeLocator::new(vcs, NameCodec::new("@"))
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[derive(Default)]
struct FakeRuntime {
    containers: String,
    ports: Option<String>,
    queries: RefCell<Vec<(String, bool)>>,
}

impl ContainerRuntime for FakeRuntime {
    fn find_by_label(&self, label: &str, include_stopped: bool) -> Result<String, WtError> {
        self.queries
            .borrow_mut()
            .push((label.to_string(), include_stopped));
        Ok(self.containers.clone())
    }

    fn published_port(
        &self,
        _container_id: &str,
        _internal_port: u16,
    ) -> Result<Option<String>, WtError> {
        Ok(self.ports.clone())
    }
}

struct FakeDevcontainer(String);

impl Devcontainer for FakeDevcontainer {
    fn bring_up(&self, _workspace_folder: &Path) -> Result<String, WtError> {
        Ok(self.0.clone())
    }
}

fn run_git_checked(cwd: &Path, args: &[&str]) {
    let output = run_capture("git", args, Some(cwd)).expect("run git command");
    assert!(
        output.status.success(),
        "git {:?} failed\nstdout:\n{}\nstderr:\n{}",
        args,
        output.stdout,
        output.stderr
    );
}

fn init_test_repo(root: &Path) -> PathBuf {
    let repo = root.join("repo");
    fs::create_dir_all(&repo).expect("mkdir repo");
    run_git_checked(&repo, &["init"]);
    run_git_checked(&repo, &["config", "user.email", "test@example.com"]);
    run_git_checked(&repo, &["config", "user.name", "Test User"]);
    fs::write(repo.join("README.md"), "hello\n").expect("write README");
    run_git_checked(&repo, &["add", "README.md"]);
    run_git_checked(&repo, &["commit", "-m", "init"]);
    repo
}

#[test]
fn test_codec_decode_recovers_encoded_name() {
    let codec = NameCodec::new("@");
    for name in ["feature", "fix-123", "with space", "a@b", "v1.2", "..."] {
        validate_worktree_name(name).expect("valid name");
        let dir = codec.encode("repo", name);
        assert_eq!(codec.decode(&dir, "repo").as_deref(), Some(name));
    }
}

#[test]
fn test_codec_encode_uses_configured_delimiter() {
    let codec = NameCodec::new("+");
    assert_eq!(codec.encode("repo", "feature"), "repo+feature");
    assert_eq!(
        codec.decode("repo+feature", "repo").as_deref(),
        Some("feature")
    );
    assert_eq!(codec.decode("repo@feature", "repo"), None);
}

#[test]
fn test_codec_decode_rejects_foreign_directories() {
    let codec = NameCodec::new("@");
    assert_eq!(codec.decode("other@feature", "repo"), None);
    assert_eq!(codec.decode("repo", "repo"), None);
    assert_eq!(codec.decode("repo@", "repo"), None);
    assert_eq!(codec.decode("repository@x", "repo"), None);
    assert_eq!(codec.decode("xrepo@x", "repo"), None);
}

#[test]
fn test_validate_worktree_name_rejects_paths() {
    for name in ["", ".", "..", "a/b", "a\\b", "/abs", "../up", "x/..", "\\"] {
        let err = validate_worktree_name(name).expect_err("invalid name");
        assert!(
            matches!(err, WtError::InvalidName { .. }),
            "unexpected error for {name:?}: {err}"
        );
    }
}

#[test]
fn test_validate_worktree_name_accepts_plain_names() {
    for name in ["feature", "a.b", "..x", "x..", "name with spaces", "@"] {
        assert!(validate_worktree_name(name).is_ok(), "rejected {name:?}");
    }
}

#[test]
fn test_project_root_from_common_dir() {
    assert_eq!(
        project_root_from_common_dir(Path::new("/tmp/repo/.git")),
        Some(PathBuf::from("/tmp/repo"))
    );
    assert_eq!(project_root_from_common_dir(Path::new(".git")), None);
}

#[test]
fn test_parse_git_worktree_porcelain() {
    let raw = "\
worktree /tmp/repo
HEAD 1111111111111111111111111111111111111111
branch refs/heads/main

worktree /tmp/repo@feature
HEAD 2222222222222222222222222222222222222222
detached

";
    let entries = parse_git_worktree_porcelain(raw);
    assert_eq!(
        entries,
        vec![
            PathBuf::from("/tmp/repo"),
            PathBuf::from("/tmp/repo@feature")
        ]
    );
}

#[test]
fn test_current_worktree_name_in_named_worktree() {
    let locator = fake_locator("/work/repo@alpha");
    assert_eq!(locator.current_worktree_name().expect("name"), "alpha");
    assert_eq!(
        locator.project_root().expect("root"),
        PathBuf::from("/work/repo")
    );
}

#[test]
fn test_current_worktree_name_fails_in_main_checkout() {
    let locator = fake_locator("/work/repo");
    let err = locator.current_worktree_name().expect_err("main checkout");
    assert!(matches!(err, WtError::NotInNamedWorktree { .. }));
    assert!(err.to_string().contains("main worktree"));
}

#[test]
fn test_current_worktree_name_fails_in_foreign_checkout() {
    let locator = fake_locator("/work/scratch");
    let err = locator.current_worktree_name().expect_err("foreign checkout");
    assert!(err.to_string().contains("not in a recognized worktree"));
    assert!(err.to_string().contains("/work/scratch"), "{err}");
}

#[test]
fn test_locator_outside_repository() {
    let locator = WorktreeLocator::new(
        FakeVcs {
            common_dir: None,
            toplevel: None,
            worktrees: Vec::new(),
        },
        NameCodec::new("@"),
    );
    assert!(matches!(
        locator.project_root(),
        Err(WtError::NotARepository)
    ));
    assert!(matches!(
        locator.current_worktree_name(),
        Err(WtError::NotARepository)
    ));
}

#[test]
fn test_enumerate_keeps_only_siblings_in_listing_order() {
    let locator = fake_locator("/work/repo");
    assert_eq!(locator.enumerate("").expect("list"), strings(&["alpha", "beta"]));
    assert_eq!(locator.enumerate("b").expect("list"), strings(&["beta"]));
    assert!(locator.enumerate("z").expect("list").is_empty());
}

#[test]
fn test_resolve_path_builds_sibling_directory() {
    let locator = fake_locator("/work/repo");
    assert_eq!(
        locator.resolve_path("feature").expect("path"),
        PathBuf::from("/work/repo@feature")
    );
    assert!(matches!(
        locator.resolve_path("../feature"),
        Err(WtError::InvalidName { .. })
    ));
}

#[test]
fn test_resolve_name_arg_dot_means_current() {
    let locator = fake_locator("/work/repo@beta");
    assert_eq!(locator.resolve_name_arg(".").expect("current"), "beta");
    assert_eq!(locator.resolve_name_arg("other").expect("explicit"), "other");
    assert!(locator.resolve_name_arg("a/b").is_err());
}

#[test]
fn test_split_worktree_args_priority_rules() {
    let locator = fake_locator("/work/repo@alpha");
    let cases: &[(&[&str], &str, &[&str])] = &[
        (&[], "alpha", &[]),
        (&["."], "alpha", &[]),
        (&[".", "ls", "-la"], "alpha", &["ls", "-la"]),
        (&["beta", "x"], "beta", &["x"]),
        (&["gamma", "x"], "alpha", &["gamma", "x"]),
        (&["alpha"], "alpha", &[]),
    ];
    for (input, name, payload) in cases {
        let resolved = locator
            .split_worktree_args(&strings(input))
            .expect("resolve args");
        assert_eq!(
            resolved,
            WorktreeArgs {
                name: name.to_string(),
                payload: strings(payload),
            },
            "input {input:?}"
        );
    }
}

#[test]
fn test_split_worktree_args_payload_matching_worktree_name_is_taken_as_name() {
    let locator = fake_locator("/work/repo@alpha");
    let resolved = locator
        .split_worktree_args(&strings(&["beta"]))
        .expect("resolve args");
    assert_eq!(resolved.name, "beta");
    assert!(resolved.payload.is_empty());
}

#[test]
fn test_split_worktree_args_requires_named_worktree() {
    let locator = fake_locator("/work/repo");
    assert!(matches!(
        locator.split_worktree_args(&[]),
        Err(WtError::NotInNamedWorktree { .. })
    ));
    assert!(locator.split_worktree_args(&strings(&["ls"])).is_err());
    let explicit = locator
        .split_worktree_args(&strings(&["beta", "ls"]))
        .expect("explicit name");
    assert_eq!(explicit.name, "beta");
}

#[test]
fn test_resolve_workspace_folder_falls_back_to_main_checkout() {
    let locator = fake_locator("/work/repo");
    let folder = locator
        .resolve_workspace_folder(&strings(&["npm", "test"]))
        .expect("fallback");
    assert_eq!(
        folder,
        WorkspaceFolder {
            path: PathBuf::from("/work/repo"),
            payload: strings(&["npm", "test"]),
        }
    );

    let named = locator
        .resolve_workspace_folder(&strings(&["beta", "npm"]))
        .expect("named");
    assert_eq!(named.path, PathBuf::from("/work/repo@beta"));
    assert_eq!(named.payload, strings(&["npm"]));
}

#[test]
fn test_resolve_workspace_folder_propagates_error_outside_main_checkout() {
    let locator = fake_locator("/work/scratch");
    let err = locator
        .resolve_workspace_folder(&[])
        .expect_err("not in a named worktree");
    assert!(err.to_string().contains("not in a recognized worktree"));
}

#[test]
fn test_resolve_workspace_folder_in_named_worktree() {
    let locator = fake_locator("/work/repo@alpha");
    let folder = locator.resolve_workspace_folder(&[]).expect("current");
    assert_eq!(folder.path, PathBuf::from("/work/repo@alpha"));
    assert!(folder.payload.is_empty());
}

#[test]
fn test_parse_container_id_takes_first_line() {
    assert_eq!(
        parse_container_id("abc123\ndef456\n").as_deref(),
        Some("abc123")
    );
    assert_eq!(parse_container_id("  abc123  \n").as_deref(), Some("abc123"));
    assert_eq!(parse_container_id(""), None);
    assert_eq!(parse_container_id("\n"), None);
}

#[test]
fn test_parse_published_port() {
    assert_eq!(
        parse_published_port("0.0.0.0:32768\n[::]:32768\n").expect("port"),
        Some(32768)
    );
    assert_eq!(parse_published_port("[::]:40000\n").expect("port"), Some(40000));
    assert_eq!(parse_published_port("").expect("blank"), None);

    for raw in ["garbage\n", "0.0.0.0:\n", "0.0.0.0:http\n", "::1:80\n"] {
        let err = parse_published_port(raw).expect_err("malformed");
        assert!(
            matches!(err, WtError::MalformedPortOutput { .. }),
            "unexpected error for {raw:?}: {err}"
        );
    }
}

#[test]
fn test_container_label_uses_worktree_path() {
    assert_eq!(
        container_label(Path::new("/work/repo@alpha")),
        "devcontainer.local_folder=/work/repo@alpha"
    );
}

#[test]
fn test_session_discovery_finds_first_container() {
    let runtime = FakeRuntime {
        containers: "abc123\ndef456\n".to_string(),
        ..FakeRuntime::default()
    };
    let sessions = SessionDiscovery::new(&runtime, 1080);
    let id = sessions
        .find_container(Path::new("/work/repo@alpha"), true)
        .expect("container");
    assert_eq!(id, "abc123");
    assert_eq!(
        runtime.queries.borrow().as_slice(),
        &[(
            "devcontainer.local_folder=/work/repo@alpha".to_string(),
            true
        )]
    );
}

#[test]
fn test_session_discovery_reports_missing_session() {
    let runtime = FakeRuntime {
        containers: "\n".to_string(),
        ..FakeRuntime::default()
    };
    let sessions = SessionDiscovery::new(&runtime, 1080);
    let err = sessions
        .proxy_port(Path::new("/work/repo@alpha"))
        .expect_err("no session");
    assert!(matches!(err, WtError::NoRunningSession { .. }));
    assert!(err.to_string().contains("repo@alpha"));
}

#[test]
fn test_session_discovery_proxy_port() {
    let runtime = FakeRuntime {
        containers: "abc123\n".to_string(),
        ports: Some("0.0.0.0:32768\n[::]:32768\n".to_string()),
        ..FakeRuntime::default()
    };
    let sessions = SessionDiscovery::new(&runtime, 1080);
    assert_eq!(
        sessions
            .proxy_port(Path::new("/work/repo@alpha"))
            .expect("port"),
        32768
    );
    assert!(!runtime.queries.borrow()[0].1, "only running containers");
}

#[test]
fn test_session_discovery_distinguishes_missing_proxy() {
    for ports in [None, Some(String::new())] {
        let runtime = FakeRuntime {
            containers: "abc123\n".to_string(),
            ports,
            ..FakeRuntime::default()
        };
        let sessions = SessionDiscovery::new(&runtime, 1080);
        let err = sessions
            .proxy_port(Path::new("/work/repo@alpha"))
            .expect_err("no proxy");
        assert!(matches!(err, WtError::NoProxyMapping { .. }));
    }
}

#[test]
fn test_last_json_line_prefers_latest_object() {
    let transcript = "\
[1 ms] Start: Run: docker buildx version
{\"containerId\":\"a\"}
[2 ms] Container started
  {\"containerId\":\"b\",\"remoteWorkspaceFolder\":\"/ws\"}
Done.
";
    assert_eq!(
        last_json_line(transcript),
        Some("{\"containerId\":\"b\",\"remoteWorkspaceFolder\":\"/ws\"}")
    );
    let session = parse_up_transcript(transcript).expect("session");
    assert_eq!(
        session,
        SessionDescriptor {
            container_id: "b".to_string(),
            remote_workspace_folder: "/ws".to_string(),
        }
    );
}

#[test]
fn test_parse_up_transcript_errors() {
    assert!(matches!(
        parse_up_transcript("building...\ndone\n"),
        Err(WtError::NoStructuredOutput)
    ));
    let err = parse_up_transcript("{\"containerId\":\"a\"}\n").expect_err("missing folder");
    assert!(matches!(err, WtError::MalformedSessionOutput { .. }));
    assert!(err.to_string().contains("containerId"));
    assert!(matches!(
        parse_up_transcript("{not json\n"),
        Err(WtError::MalformedSessionOutput { .. })
    ));
}

#[test]
fn test_attached_container_uri_hex_encodes_id() {
    let session = SessionDescriptor {
        container_id: "abc".to_string(),
        remote_workspace_folder: "/workspaces/repo".to_string(),
    };
    assert_eq!(
        attached_container_uri(&session),
        "vscode-remote://attached-container+616263/workspaces/repo"
    );
}

#[test]
fn test_discover_session_through_devcontainer() {
    let devcontainer = FakeDevcontainer(
        "progress\n{\"outcome\":\"success\",\"containerId\":\"f00\",\"remoteUser\":\"dev\",\"remoteWorkspaceFolder\":\"/workspaces/repo@alpha\"}\n"
            .to_string(),
    );
    let session = discover_session(&devcontainer, Path::new("/work/repo@alpha")).expect("session");
    assert_eq!(session.container_id, "f00");
    assert_eq!(session.remote_workspace_folder, "/workspaces/repo@alpha");
}

#[test]
fn test_vscode_attach_args() {
    let session = SessionDescriptor {
        container_id: "abc".to_string(),
        remote_workspace_folder: "/ws".to_string(),
    };
    let args = attach_args(
        &session,
        Some(Path::new("/home/me/.vscode/extensions")),
        Path::new("/work/repo@alpha/.vscode-profile"),
        Some(32768),
    );
    assert_eq!(
        args,
        strings(&[
            "--user-data-dir",
            "/work/repo@alpha/.vscode-profile",
            "--folder-uri",
            "vscode-remote://attached-container+616263/ws",
            "--extensions-dir",
            "/home/me/.vscode/extensions",
            "--proxy-server=socks5://127.0.0.1:32768",
        ])
    );

    let without_proxy = attach_args(&session, None, Path::new("/p"), None);
    assert!(!without_proxy.iter().any(|arg| arg.starts_with("--proxy")));
    assert!(!without_proxy.iter().any(|arg| arg == "--extensions-dir"));
}

#[test]
fn test_normalize_localhost_url() {
    assert_eq!(
        normalize_localhost_url("http://localhost/"),
        "http://127.0.0.1/"
    );
    assert_eq!(
        normalize_localhost_url("http://localhost:9/"),
        "http://127.0.0.1:9/"
    );
    assert_eq!(
        normalize_localhost_url("https://localhost:8443/api?q=1"),
        "https://127.0.0.1:8443/api?q=1"
    );
    assert_eq!(
        normalize_localhost_url("http://example.com/"),
        "http://example.com/"
    );
    assert_eq!(
        normalize_localhost_url("http://localhost:80/x"),
        "http://127.0.0.1:80/x"
    );
    assert_eq!(normalize_localhost_url("http://localhost"), "http://127.0.0.1");
    assert_eq!(
        normalize_localhost_url("http://localhost:3000/a b"),
        "http://127.0.0.1:3000/a b"
    );
    assert_eq!(
        normalize_localhost_url("http://user@localhost:9?q=localhost"),
        "http://user@127.0.0.1:9?q=localhost"
    );
    assert_eq!(normalize_localhost_url("-v"), "-v");
    assert_eq!(normalize_localhost_url("localhost:3000"), "localhost:3000");
}

#[test]
fn test_proxy_url() {
    assert_eq!(
        proxy_url(ProxyScheme::Socks5, 32768),
        "socks5://127.0.0.1:32768"
    );
    assert_eq!(
        proxy_url(ProxyScheme::Socks5h, 32768),
        "socks5h://127.0.0.1:32768"
    );
}

#[test]
fn test_browser_args_route_through_proxy() {
    let extra = strings(&["http://127.0.0.1:3000/"]);
    let chrome = chrome_args(Path::new("/w/.chrome-profile"), 4000, &extra);
    assert_eq!(chrome[0], "--user-data-dir=/w/.chrome-profile");
    assert!(chrome.contains(&"--proxy-server=socks5://127.0.0.1:4000".to_string()));
    assert!(chrome.contains(&"--proxy-bypass-list=<-loopback>".to_string()));
    assert_eq!(chrome.last(), extra.last());

    let playwright = playwright_args(4000, &extra);
    assert_eq!(
        playwright,
        strings(&[
            "playwright",
            "open",
            "--proxy-server=socks5://127.0.0.1:4000",
            "http://127.0.0.1:3000/",
        ])
    );

    let curl = curl_args(4000, &strings(&["-s", "http://api/"]));
    assert_eq!(
        curl,
        strings(&[
            "--proxy",
            "socks5h://127.0.0.1:4000",
            "--noproxy",
            "",
            "-s",
            "http://api/",
        ])
    );
}

#[test]
fn test_strip_separator() {
    assert_eq!(strip_separator(&strings(&["--", "ls"])), strings(&["ls"]));
    assert_eq!(strip_separator(&strings(&["ls", "--"])), strings(&["ls", "--"]));
    assert!(strip_separator(&[]).is_empty());
}

#[test]
fn test_config_defaults() {
    let config = Config::from_toml("").expect("empty config");
    assert_eq!(config, Config::default());
    assert_eq!(config.delimiter, "@");
    assert_eq!(config.proxy_port, 1080);
    assert_eq!(config.docker_bin, "docker");
}

#[test]
fn test_config_overrides_and_ignores_blank_bins() {
    let config = Config::from_toml(
        "delimiter = \"+\"\nproxy_port = 1081\ndocker_bin = \"podman\"\ncode_bin = \"  \"\n",
    )
    .expect("config");
    assert_eq!(config.delimiter, "+");
    assert_eq!(config.proxy_port, 1081);
    assert_eq!(config.docker_bin, "podman");
    assert_eq!(config.code_bin, "code");
}

#[test]
fn test_config_rejects_bad_delimiter() {
    assert!(Config::from_toml("delimiter = \"\"").is_err());
    assert!(Config::from_toml("delimiter = \"/\"").is_err());
    assert!(Config::from_toml("proxy_port = 0").is_err());
}

#[test]
fn test_config_from_file() {
    let temp = TempDir::new().expect("tempdir");
    let path = temp.path().join("config.toml");
    fs::write(&path, "devcontainer_bin = \"/opt/dc\"\n").expect("write config");
    let config = Config::from_file(&path).expect("config");
    assert_eq!(config.devcontainer_bin, "/opt/dc");

    fs::write(&path, "proxy_port = \"nope\"\n").expect("write config");
    let err = Config::from_file(&path).expect_err("bad config");
    assert!(format!("{err:#}").contains("failed to parse config file"));
}

#[test]
fn test_perform_exit_returns_code() {
    assert_eq!(perform(Action::Exit(3)).expect("exit"), 3);
    assert_eq!(perform(Action::success()).expect("exit"), 0);
}

#[test]
fn test_exec_spec_builder() {
    let action: Action = ExecSpec::new("devcontainer", strings(&["exec"]))
        .in_dir(Path::new("/work/repo@alpha"))
        .with_env("DOCKER_CLI_HINTS", "false")
        .into();
    let Action::Exec(spec) = action else {
        panic!("expected exec action");
    };
    assert_eq!(spec.program, "devcontainer");
    assert_eq!(spec.cwd, Some(PathBuf::from("/work/repo@alpha")));
    assert_eq!(
        spec.env,
        vec![("DOCKER_CLI_HINTS".to_string(), "false".to_string())]
    );
}

#[test]
fn test_cli_parses_trailing_payload() {
    let cli = Cli::try_parse_from(["wt", "exec", "beta", "ls", "-la"]).expect("parse exec");
    match cli.command {
        Commands::Exec { args } => assert_eq!(args, strings(&["beta", "ls", "-la"])),
        _ => panic!("expected exec command"),
    }

    let cli = Cli::try_parse_from(["wt", "rm", "foo", "--force"]).expect("parse rm");
    match cli.command {
        Commands::Rm { name, git_args } => {
            assert_eq!(name, "foo");
            assert_eq!(git_args, strings(&["--force"]));
        }
        _ => panic!("expected rm command"),
    }
}

#[test]
fn test_cli_parses_aliases_and_flags() {
    let cli = Cli::try_parse_from(["wt", "-v", "list"]).expect("parse ls alias");
    assert!(cli.verbose);
    assert!(matches!(cli.command, Commands::Ls));

    let cli = Cli::try_parse_from(["wt", "cd", "feature", "-c"]).expect("parse cd");
    match cli.command {
        Commands::Cd { name, create } => {
            assert_eq!(name.as_deref(), Some("feature"));
            assert!(create);
        }
        _ => panic!("expected cd command"),
    }

    assert!(Cli::try_parse_from(["wt", "proxy-port", "a", "b"]).is_err());
}

#[test]
fn test_shell_helpers() {
    assert_eq!(normalize_process_command("-zsh\n").as_deref(), Some("zsh"));
    assert_eq!(normalize_process_command("bash").as_deref(), Some("bash"));
    assert_eq!(normalize_process_command("  \n"), None);
    assert_eq!(shell_quote("a'b"), "'a'\"'\"'b'");
    assert_eq!(
        shell_join(&strings(&["curl", "--noproxy", ""])),
        "curl --noproxy ''"
    );
}

struct BrokenPipe {
    sent: bool,
}

impl Read for BrokenPipe {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.sent {
            return Err(io::Error::other("pipe closed"));
        }
        self.sent = true;
        buf[..4].copy_from_slice(b"50%\r");
        Ok(4)
    }
}

#[test]
fn test_tee_copies_raw_bytes() {
    let raw = b"step \xff\r50%\r100%\n{\"containerId\":\"c\"}";
    let mut terminal: Vec<u8> = Vec::new();
    let captured = tee(&raw[..], &mut terminal).expect("tee");
    assert_eq!(terminal, raw.to_vec());
    assert_eq!(captured, raw.to_vec());
}

#[test]
fn test_tee_reports_read_errors_after_partial_output() {
    let mut terminal: Vec<u8> = Vec::new();
    let err = tee(BrokenPipe { sent: false }, &mut terminal).expect_err("read error");
    assert_eq!(err.to_string(), "pipe closed");
    assert_eq!(terminal, b"50%\r".to_vec());
}

#[test]
fn test_run_tee_keeps_summary_after_invalid_utf8() {
    let script = "printf 'step \\377\\n{\"containerId\":\"c\",\"remoteWorkspaceFolder\":\"/w\"}\\n'";
    let output = run_tee("sh", &["-c", script], None).expect("run sh");
    assert!(output.status.success());
    assert!(output.stdout.starts_with("step \u{FFFD}\n"), "{:?}", output.stdout);
    let session = parse_up_transcript(&output.stdout).expect("session");
    assert_eq!(session.container_id, "c");
    assert_eq!(session.remote_workspace_folder, "/w");
}

#[test]
fn test_worktree_candidates_filter_by_prefix() {
    let values = |current: &str| -> Vec<String> {
        worktree_candidates(&fake_locator("/work/repo"), OsStr::new(current))
            .iter()
            .map(|candidate| candidate.get_value().to_string_lossy().into_owned())
            .collect()
    };
    assert_eq!(values(""), strings(&["alpha", "beta"]));
    assert_eq!(values("b"), strings(&["beta"]));
    assert!(values("z").is_empty());

    let outside = WorktreeLocator::new(
        FakeVcs {
            common_dir: None,
            toplevel: None,
            worktrees: Vec::new(),
        },
        NameCodec::new("@"),
    );
    assert!(worktree_candidates(&outside, OsStr::new("")).is_empty());
}

#[test]
fn test_completion_registration_calls_back_into_wt() {
    let mut script: Vec<u8> = Vec::new();
    write_registration(clap_complete::Shell::Bash, &mut script).expect("bash registration");
    let script = String::from_utf8(script).expect("utf-8 script");
    assert!(script.contains("COMPLETE"), "{script}");
    assert!(script.contains("wt"), "{script}");
}

#[test]
fn test_best_error_line() {
    assert_eq!(
        best_error_line("hint: foo\nfatal: not a git repository\n"),
        "fatal: not a git repository"
    );
    assert_eq!(
        best_error_line("warning: x\nError: no such container\nmore\n"),
        "Error: no such container"
    );
    assert_eq!(best_error_line("  \n"), "unknown error");
}

#[test]
fn test_is_affirmative() {
    assert!(is_affirmative("y\n"));
    assert!(is_affirmative(" YES "));
    assert!(!is_affirmative(""));
    assert!(!is_affirmative("no"));
}

#[test]
fn test_ensure_target_free() {
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path();
    assert!(ensure_target_free(&root.join("missing")).is_ok());

    fs::write(root.join("file"), "x").expect("write file");
    let err = ensure_target_free(&root.join("file")).expect_err("file");
    assert!(err.to_string().contains("already exists as a file"));

    fs::create_dir_all(root.join("plain")).expect("mkdir plain");
    let err = ensure_target_free(&root.join("plain")).expect_err("plain dir");
    assert!(err.to_string().contains("not a git worktree"));

    fs::create_dir_all(root.join("tree")).expect("mkdir tree");
    fs::write(root.join("tree").join(".git"), "gitdir: x\n").expect("write .git");
    let err = ensure_target_free(&root.join("tree")).expect_err("worktree");
    assert!(err.to_string().contains("with a .git entry"));
}

#[test]
fn test_scaffold_worktree_env_copies_and_tags_devcontainer_env() {
    let temp = TempDir::new().expect("tempdir");
    let source = temp.path().join("repo");
    let worktree = temp.path().join("repo@feature");
    fs::create_dir_all(source.join(".devcontainer")).expect("mkdir source");
    fs::create_dir_all(worktree.join(".devcontainer")).expect("mkdir worktree");
    fs::write(source.join(".env"), "TOKEN=1\n").expect("write .env");
    fs::write(source.join(".devcontainer").join(".env"), "PORT=3000\n").expect("write dev env");

    scaffold_worktree_env(&source, &worktree, "feature");

    assert_eq!(
        fs::read_to_string(worktree.join(".env")).expect("read .env"),
        "TOKEN=1\n"
    );
    assert_eq!(
        fs::read_to_string(worktree.join(".devcontainer").join(".env")).expect("read dev env"),
        "PORT=3000\nGIT_WORKTREE=feature\n"
    );
    assert!(!worktree.join(".envrc").exists());
}

#[test]
fn test_scaffold_worktree_env_without_devcontainer() {
    let temp = TempDir::new().expect("tempdir");
    let source = temp.path().join("repo");
    let worktree = temp.path().join("repo@feature");
    fs::create_dir_all(&source).expect("mkdir source");
    fs::create_dir_all(&worktree).expect("mkdir worktree");

    scaffold_worktree_env(&source, &worktree, "feature");

    assert!(!worktree.join(".env").exists());
    assert!(!worktree.join(".devcontainer").exists());
}

#[test]
fn test_write_devcontainer_templates() {
    let temp = TempDir::new().expect("tempdir");
    write_devcontainer_templates(temp.path(), 1081, false).expect("write templates");

    let dir = temp.path().join(".devcontainer");
    for name in ["devcontainer.json", "Dockerfile", "supervisord.conf"] {
        let content = fs::read_to_string(dir.join(name)).expect("read template");
        assert!(!content.contains("{{PROXY_PORT}}"), "{name} not rendered");
    }
    let json = fs::read_to_string(dir.join("devcontainer.json")).expect("read json");
    assert!(json.contains("127.0.0.1::1081"));

    let err = write_devcontainer_templates(temp.path(), 1081, false).expect_err("exists");
    assert!(err.to_string().contains("--force"));
    write_devcontainer_templates(temp.path(), 1080, true).expect("force overwrite");
}

#[test]
fn test_git_locator_inside_sibling_worktree() {
    let temp = TempDir::new().expect("tempdir");
    let repo = init_test_repo(temp.path());
    let worktree = temp.path().join("repo@feature");
    let worktree_arg = worktree.to_string_lossy().to_string();
    run_git_checked(
        &repo,
        &["worktree", "add", "--detach", &worktree_arg, "HEAD"],
    );
    let nested = worktree.join("src");
    fs::create_dir_all(&nested).expect("mkdir nested");

    let locator = WorktreeLocator::new(GitCli::in_dir("git", &nested), NameCodec::new("@"));
    assert_eq!(
        locator
            .project_root()
            .expect("project root")
            .canonicalize()
            .expect("canonical root"),
        repo.canonicalize().expect("canonical repo")
    );
    assert_eq!(locator.current_worktree_name().expect("name"), "feature");
    assert_eq!(locator.enumerate("").expect("list"), strings(&["feature"]));
    assert_eq!(locator.enumerate("x").expect("list"), Vec::<String>::new());

    let other = locator.resolve_path("other").expect("path");
    assert_eq!(other.file_name().expect("file name"), "repo@other");
}

#[test]
fn test_git_locator_in_main_checkout() {
    let temp = TempDir::new().expect("tempdir");
    let repo = init_test_repo(temp.path());

    let locator = WorktreeLocator::new(GitCli::in_dir("git", &repo), NameCodec::new("@"));
    assert!(matches!(
        locator.current_worktree_name(),
        Err(WtError::NotInNamedWorktree { .. })
    ));
    let folder = locator.resolve_workspace_folder(&[]).expect("fallback");
    assert_eq!(
        folder.path.canonicalize().expect("canonical folder"),
        repo.canonicalize().expect("canonical repo")
    );
}

#[test]
fn test_git_locator_outside_repository() {
    let temp = TempDir::new().expect("tempdir");
    let locator = WorktreeLocator::new(GitCli::in_dir("git", temp.path()), NameCodec::new("@"));
    assert!(matches!(
        locator.project_root(),
        Err(WtError::NotARepository)
    ));
}
