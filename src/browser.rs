use crate::net::{ProxyScheme, proxy_url};
use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

const CHROME_NAMES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium-browser",
    "chromium",
];
const CHROME_MACOS_APP: &str = "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome";

pub(crate) fn find_chrome() -> Result<PathBuf> {
    if let Some(path) = CHROME_NAMES
        .iter()
        .find_map(|name| which::which(name).ok())
    {
        return Ok(path);
    }
    if cfg!(target_os = "macos") && Path::new(CHROME_MACOS_APP).exists() {
        return Ok(PathBuf::from(CHROME_MACOS_APP));
    }
    bail!("could not find Chrome or Chromium; install Google Chrome or add it to your PATH")
}

/// Chrome flags for an isolated profile whose traffic, loopback included, goes
/// through the worktree's proxy.
pub(crate) fn chrome_args(profile_dir: &Path, proxy_port: u16, extra: &[String]) -> Vec<String> {
    let mut args = vec![
        format!("--user-data-dir={}", profile_dir.display()),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
        "--disable-sync".to_string(),
        "--disable-features=ChromeSignin".to_string(),
        format!(
            "--proxy-server={}",
            proxy_url(ProxyScheme::Socks5, proxy_port)
        ),
        "--proxy-bypass-list=<-loopback>".to_string(),
    ];
    args.extend_from_slice(extra);
    args
}

pub(crate) fn playwright_args(proxy_port: u16, extra: &[String]) -> Vec<String> {
    let mut args = vec![
        "playwright".to_string(),
        "open".to_string(),
        format!(
            "--proxy-server={}",
            proxy_url(ProxyScheme::Socks5, proxy_port)
        ),
    ];
    args.extend_from_slice(extra);
    args
}

/// `socks5h` so that hostnames resolve inside the container.
pub(crate) fn curl_args(proxy_port: u16, extra: &[String]) -> Vec<String> {
    let mut args = vec![
        "--proxy".to_string(),
        proxy_url(ProxyScheme::Socks5h, proxy_port),
        "--noproxy".to_string(),
        String::new(),
    ];
    args.extend_from_slice(extra);
    args
}
