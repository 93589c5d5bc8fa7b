use crate::constants::DEVCONTAINER_LABEL;
use crate::error::WtError;
use crate::runtime::ContainerRuntime;
use std::path::Path;

/// Locates the devcontainer for a worktree and the host port its SOCKS5 proxy
/// is published on.
pub(crate) struct SessionDiscovery<'a, R> {
    runtime: &'a R,
    proxy_port: u16,
}

impl<'a, R: ContainerRuntime> SessionDiscovery<'a, R> {
    pub(crate) fn new(runtime: &'a R, proxy_port: u16) -> Self {
        Self {
            runtime,
            proxy_port,
        }
    }

    /// Running container for `worktree_path`. With `include_stopped`, exited
    /// containers count as well.
    pub(crate) fn find_container(
        &self,
        worktree_path: &Path,
        include_stopped: bool,
    ) -> Result<String, WtError> {
        let label = container_label(worktree_path);
        let raw = self.runtime.find_by_label(&label, include_stopped)?;
        parse_container_id(&raw).ok_or_else(|| WtError::no_session(worktree_path))
    }

    pub(crate) fn proxy_port(&self, worktree_path: &Path) -> Result<u16, WtError> {
        let container_id = self.find_container(worktree_path, false)?;
        log::debug!(
            "devcontainer for {} is {container_id}",
            worktree_path.display()
        );
        let raw = self
            .runtime
            .published_port(&container_id, self.proxy_port)?
            .ok_or_else(|| WtError::no_proxy(worktree_path))?;
        parse_published_port(&raw)?.ok_or_else(|| WtError::no_proxy(worktree_path))
    }
}

pub(crate) fn container_label(worktree_path: &Path) -> String {
    format!("{DEVCONTAINER_LABEL}={}", worktree_path.display())
}

/// First identifier of `docker ps -q` style output. Older duplicate containers
/// may follow; only the first line is considered.
pub(crate) fn parse_container_id(raw: &str) -> Option<String> {
    let first = raw.lines().next()?.trim();
    if first.is_empty() {
        return None;
    }
    Some(first.to_string())
}

/// Host port from `docker port` output (`0.0.0.0:32768`, `[::]:32768`, one
/// per address family). Blank output means no mapping.
pub(crate) fn parse_published_port(raw: &str) -> Result<Option<u16>, WtError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    let line = raw.lines().next().unwrap_or_default().trim();
    let malformed = || WtError::MalformedPortOutput {
        line: line.to_string(),
    };
    let (_, port) = split_host_port(line).ok_or_else(malformed)?;
    port.parse::<u16>().map(Some).map_err(|_| malformed())
}

fn split_host_port(addr: &str) -> Option<(&str, &str)> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest.split_once(']')?;
        return Some((host, tail.strip_prefix(':')?));
    }
    let (host, port) = addr.rsplit_once(':')?;
    if host.contains(':') {
        return None;
    }
    Some((host, port))
}
