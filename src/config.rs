//! TOML configuration.
//!
//! ```toml
//! [storage]
//! backend = "local"
//!
//! [storage.local]
//! path = "./data/origin.json"
//!
//! [storage.remote]
//! base_url = "http://localhost:3001"
//!
//! [slideshow]
//! interval_ms = 5000
//! ```
//!
//! Every section is optional; [`Config::minimal`] gives the defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use govwatch_core::counties::CountyRegistry;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub slideshow: SlideshowConfig,
    #[serde(default)]
    pub counties: CountiesConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Local,
    Remote,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub local: LocalStorageConfig,
    #[serde(default)]
    pub remote: RemoteStorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LocalStorageConfig {
    #[serde(default = "default_local_path")]
    pub path: PathBuf,
    #[serde(default = "default_key")]
    pub key: String,
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: usize,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            path: default_local_path(),
            key: default_key(),
            quota_bytes: default_quota_bytes(),
        }
    }
}

fn default_local_path() -> PathBuf {
    PathBuf::from("./data/origin.json")
}
fn default_key() -> String {
    "governanceReports".to_string()
}
fn default_quota_bytes() -> usize {
    5 * 1024 * 1024
}

#[derive(Debug, Deserialize, Clone)]
pub struct RemoteStorageConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for RemoteStorageConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3001".to_string()
}

impl RemoteStorageConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SlideshowConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for SlideshowConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

fn default_interval_ms() -> u64 {
    5000
}

impl SlideshowConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CountiesConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3001".to_string()
}

impl Config {
    /// Defaults for every section, used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Load the county list named in `[counties].path`, or the bundled one.
    pub fn load_counties(&self) -> Result<CountyRegistry> {
        match &self.counties.path {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read county list: {}", path.display()))?;
                CountyRegistry::from_json(&json)
                    .with_context(|| format!("Failed to parse county list: {}", path.display()))
            }
            None => Ok(CountyRegistry::bundled()),
        }
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.slideshow.interval_ms == 0 {
        anyhow::bail!("slideshow.interval_ms must be > 0");
    }

    if config.storage.local.key.trim().is_empty() {
        anyhow::bail!("storage.local.key must not be empty");
    }

    if config.storage.local.quota_bytes == 0 {
        anyhow::bail!("storage.local.quota_bytes must be > 0");
    }

    if config.storage.backend == BackendKind::Remote {
        let url = &config.storage.remote.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            anyhow::bail!(
                "storage.remote.base_url must be an http(s) URL, got '{}'",
                url
            );
        }
    }

    if config.storage.remote.timeout_secs == Some(0) {
        anyhow::bail!("storage.remote.timeout_secs must be > 0 when set");
    }

    Ok(config)
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}
