//! Monitor configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Daemon connection settings
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Monitor output settings
    #[serde(default)]
    pub monitor: MonitorConfig,
}

/// Daemon connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Websocket endpoint of the mixer daemon
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Seconds between connect attempts
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self { endpoint: default_endpoint(), retry_interval_secs: default_retry_interval_secs() }
    }
}

fn default_endpoint() -> String {
    "ws://127.0.0.1:14564/api/websocket".to_string()
}

fn default_retry_interval_secs() -> u64 {
    5
}

/// Monitor output settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MonitorConfig {
    /// Only log patches whose path matches this template
    /// (`*` matches one segment, e.g. `/mixers/*/levels/volumes/*`).
    /// Absent means log everything.
    pub watch: Option<String>,
}

/// Load configuration from file or defaults.
pub fn load_config() -> Result<Config> {
    let config_path = config_path()?;

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {config_path:?}"))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {config_path:?}"))?;
        Ok(config)
    } else {
        info!(?config_path, "Config file not found, using defaults");
        Ok(Config::default())
    }
}

/// Get the configuration file path.
fn config_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "mixlink", "Mixlink")
        .context("Could not determine config directory")?;
    Ok(dirs.config_dir().join("config.toml"))
}
