// src/config.rs

//! Runtime configuration
//!
//! Sources, lowest precedence first: built-in defaults, a TOML file,
//! environment variables, then command-line flags (applied by the caller).
//!
//! ```toml
//! toolshed_url = "https://toolshed.g2.bx.psu.edu"
//! galaxy_url = "https://usegalaxy.example"
//! cache_dir = "/var/cache/revlock/repos"
//! http_timeout_secs = 60
//! max_retries = 5
//! ```

use crate::error::{Error, Result};
use crate::lockfile::DEFAULT_TOOL_SHED_URL;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const ENV_TOOLSHED_URL: &str = "REVLOCK_TOOLSHED_URL";
pub const ENV_CACHE_DIR: &str = "REVLOCK_CACHE_DIR";
pub const ENV_GALAXY_URL: &str = "GALAXY_URL";
pub const ENV_GALAXY_API_KEY: &str = "GALAXY_API_KEY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tool Shed to reconcile against
    pub toolshed_url: String,

    /// Galaxy server consulted by the installed-system safety gate
    pub galaxy_url: Option<String>,

    pub galaxy_api_key: Option<String>,

    /// Where Mercurial clones are kept between runs
    pub cache_dir: PathBuf,

    pub http_timeout_secs: u64,

    pub max_retries: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            toolshed_url: DEFAULT_TOOL_SHED_URL.to_string(),
            galaxy_url: None,
            galaxy_api_key: None,
            cache_dir: default_cache_dir(),
            http_timeout_secs: 30,
            max_retries: 3,
        }
    }
}

fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("revlock")
        .join("repos")
}

/// `<config dir>/revlock/config.toml`, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("revlock").join("config.toml"))
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit `path` must exist; otherwise the default config file is
    /// read when present. Environment overrides are applied on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading configuration from {}", path.display());
        let content = fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("Failed to read {}: {e}", path.display())))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))
    }

    /// Apply environment overrides; empty values are ignored
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(url) = var(ENV_TOOLSHED_URL) {
            self.toolshed_url = url;
        }
        if let Some(dir) = var(ENV_CACHE_DIR) {
            self.cache_dir = PathBuf::from(dir);
        }
        if let Some(url) = var(ENV_GALAXY_URL) {
            self.galaxy_url = Some(url);
        }
        if let Some(key) = var(ENV_GALAXY_API_KEY) {
            self.galaxy_api_key = Some(key);
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
