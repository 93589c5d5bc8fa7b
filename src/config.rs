use crate::constants::{
    DEFAULT_CODE_BIN, DEFAULT_DELIMITER, DEFAULT_DEVCONTAINER_BIN, DEFAULT_DOCKER_BIN,
    DEFAULT_GIT_BIN, DEFAULT_PROXY_PORT,
};
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default)]
struct PartialConfig {
    delimiter: Option<String>,
    proxy_port: Option<u16>,
    git_bin: Option<String>,
    docker_bin: Option<String>,
    devcontainer_bin: Option<String>,
    code_bin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Config {
    pub(crate) delimiter: String,
    pub(crate) proxy_port: u16,
    pub(crate) git_bin: String,
    pub(crate) docker_bin: String,
    pub(crate) devcontainer_bin: String,
    pub(crate) code_bin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER.to_string(),
            proxy_port: DEFAULT_PROXY_PORT,
            git_bin: DEFAULT_GIT_BIN.to_string(),
            docker_bin: DEFAULT_DOCKER_BIN.to_string(),
            devcontainer_bin: DEFAULT_DEVCONTAINER_BIN.to_string(),
            code_bin: DEFAULT_CODE_BIN.to_string(),
        }
    }
}

impl Config {
    pub(crate) fn load() -> Result<Self> {
        for path in config_paths() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    pub(crate) fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub(crate) fn from_toml(raw: &str) -> Result<Self> {
        let parsed: PartialConfig = toml::from_str(raw)?;
        let mut config = Self::default();

        if let Some(delimiter) = parsed.delimiter {
            if delimiter.is_empty() || delimiter.contains('/') || delimiter.contains('\\') {
                bail!("delimiter `{delimiter}` must be non-empty and free of path separators");
            }
            config.delimiter = delimiter;
        }
        if let Some(proxy_port) = parsed.proxy_port {
            if proxy_port == 0 {
                bail!("proxy_port must not be 0");
            }
            config.proxy_port = proxy_port;
        }
        override_bin(&mut config.git_bin, parsed.git_bin);
        override_bin(&mut config.docker_bin, parsed.docker_bin);
        override_bin(&mut config.devcontainer_bin, parsed.devcontainer_bin);
        override_bin(&mut config.code_bin, parsed.code_bin);
        Ok(config)
    }
}

fn override_bin(slot: &mut String, value: Option<String>) {
    if let Some(value) = value
        && !value.trim().is_empty()
    {
        *slot = value;
    }
}

fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("wt").join("config.toml"));
    }
    if let Some(home_dir) = dirs::home_dir() {
        paths.push(home_dir.join(".wt.toml"));
    }
    paths
}
