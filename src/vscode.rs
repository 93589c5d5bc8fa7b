use crate::attach::{SessionDescriptor, attached_container_uri};
use crate::constants::VSCODE_PROFILE_DIR;
use crate::net::{ProxyScheme, proxy_url};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

fn default_user_data_dir() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    if cfg!(target_os = "macos") {
        Some(home.join("Library").join("Application Support").join("Code"))
    } else if cfg!(target_os = "linux") {
        Some(home.join(".config").join("Code"))
    } else {
        None
    }
}

fn default_extensions_dir() -> Option<PathBuf> {
    let dir = dirs::home_dir()?.join(".vscode").join("extensions");
    dir.exists().then_some(dir)
}

/// Per-worktree user data dir whose `User` settings are shared with the
/// default VS Code profile. Best effort: failures leave a fresh profile.
fn prepare_profile(user_data_dir: &Path) {
    let Some(default_user_dir) = default_user_data_dir().map(|dir| dir.join("User")) else {
        return;
    };
    if !default_user_dir.exists() {
        return;
    }
    if let Err(err) = fs::create_dir_all(user_data_dir) {
        log::warn!("failed to create {}: {err}", user_data_dir.display());
        return;
    }
    let link = user_data_dir.join("User");
    match fs::symlink_metadata(&link) {
        Err(err) if err.kind() == ErrorKind::NotFound => {
            if let Err(err) = symlink_dir(&default_user_dir, &link) {
                log::warn!("failed to link {}: {err}", link.display());
            }
        }
        _ => {}
    }
}

#[cfg(unix)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_dir(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

/// Arguments that open VS Code attached to `session`.
pub(crate) fn attach_args(
    session: &SessionDescriptor,
    extensions_dir: Option<&Path>,
    user_data_dir: &Path,
    proxy_port: Option<u16>,
) -> Vec<String> {
    let mut args = vec![
        "--user-data-dir".to_string(),
        user_data_dir.display().to_string(),
        "--folder-uri".to_string(),
        attached_container_uri(session),
    ];
    if let Some(dir) = extensions_dir {
        args.push("--extensions-dir".to_string());
        args.push(dir.display().to_string());
    }
    if let Some(port) = proxy_port {
        args.push(format!(
            "--proxy-server={}",
            proxy_url(ProxyScheme::Socks5, port)
        ));
    }
    args
}

pub(crate) fn attach_args_for_worktree(
    worktree_dir: &Path,
    session: &SessionDescriptor,
    proxy_port: Option<u16>,
) -> Vec<String> {
    let user_data_dir = worktree_dir.join(VSCODE_PROFILE_DIR);
    prepare_profile(&user_data_dir);
    attach_args(
        session,
        default_extensions_dir().as_deref(),
        &user_data_dir,
        proxy_port,
    )
}
