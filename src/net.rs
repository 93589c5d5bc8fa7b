use crate::constants::{LOOPBACK_ADDR, LOOPBACK_HOSTNAME};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProxyScheme {
    /// Client resolves hostnames itself.
    Socks5,
    /// Hostnames are resolved by the proxy, inside the container.
    Socks5h,
}

impl std::fmt::Display for ProxyScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Socks5 => write!(f, "socks5"),
            Self::Socks5h => write!(f, "socks5h"),
        }
    }
}

pub(crate) fn proxy_url(scheme: ProxyScheme, port: u16) -> String {
    format!("{scheme}://{LOOPBACK_ADDR}:{port}")
}

/// Rewrites a `localhost` URL to the literal loopback address. Through the
/// proxy, `localhost` would be looked up inside the container's namespace.
/// Only the host is replaced; port, path and query keep their original text.
/// Anything that is not a URL with a `localhost` host comes back unchanged.
pub(crate) fn normalize_localhost_url(arg: &str) -> String {
    let Ok(parsed) = Url::parse(arg) else {
        return arg.to_string();
    };
    if parsed.host_str() != Some(LOOPBACK_HOSTNAME) {
        return arg.to_string();
    }
    match localhost_span(arg) {
        Some((start, end)) => format!("{}{LOOPBACK_ADDR}{}", &arg[..start], &arg[end..]),
        None => arg.to_string(),
    }
}

/// Byte range of the host in `scheme://[userinfo@]host[:port]...`, if the
/// text there spells `localhost`.
fn localhost_span(arg: &str) -> Option<(usize, usize)> {
    let authority_start = arg.find("://")? + 3;
    let rest = &arg[authority_start..];
    let authority = &rest[..rest.find(['/', '\\', '?', '#']).unwrap_or(rest.len())];
    let host_start = authority.rfind('@').map_or(0, |at| at + 1);
    let host = &authority[host_start..];
    let host = &host[..host.find(':').unwrap_or(host.len())];
    if !host.eq_ignore_ascii_case(LOOPBACK_HOSTNAME) {
        return None;
    }
    let start = authority_start + host_start;
    Some((start, start + host.len()))
}

pub(crate) fn normalize_localhost_args(args: &[String]) -> Vec<String> {
    args.iter().map(|arg| normalize_localhost_url(arg)).collect()
}
