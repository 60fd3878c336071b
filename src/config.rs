//! Server configuration.
//!
//! Defaults, optionally overlaid by a YAML file named in `BURROW_CONFIG`,
//! then by the `LISTEN` and `BURROW_ROOT` environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

pub const CONFIG_ENV: &str = "BURROW_CONFIG";
pub const LISTEN_ENV: &str = "LISTEN";
pub const ROOT_ENV: &str = "BURROW_ROOT";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub files: FilesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to
    pub listen_addr: String,
    /// Upper bound on connections handled at once
    pub max_connections: usize,
    /// Size of each socket read while framing a request
    pub read_buffer_size: usize,
    /// Largest accepted request line + header block
    pub max_header_size: usize,
    /// Largest accepted `Content-Length`
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Directory everything is served from and uploaded into
    pub root: PathBuf,
    /// Nesting levels expanded in a directory listing
    pub max_tree_depth: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            max_connections: 1024,
            read_buffer_size: 4096,
            max_header_size: 64 * 1024,
            max_body_size: 256 * 1024 * 1024,
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./web"),
            max_tree_depth: 32,
        }
    }
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Loads configuration using `lookup` for environment variables.
    pub fn load_with<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = match lookup(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };

        if let Some(addr) = lookup(LISTEN_ENV) {
            cfg.server.listen_addr = addr;
        }
        if let Some(root) = lookup(ROOT_ENV) {
            cfg.files.root = PathBuf::from(root);
        }

        Ok(cfg)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(content)?;
        Ok(cfg)
    }
}
