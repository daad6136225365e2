//! Runtime configuration for chain-resource.
//!
//! Configuration can be loaded from a JSON file or constructed programmatically.
//! Every tier's knobs (expirations, paths, endpoint, timeouts) live here.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Command-line arguments.
#[derive(Parser, Debug, Clone)]
#[command(name = "chain-resource", about = "Resolve exchange rates through memory, disk and web tiers")]
pub struct Cli {
    /// Path to configuration file (JSON).
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    /// Access token for the rates web service (overrides the config file).
    #[arg(long, env = "OXR_APP_ID")]
    pub app_id: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Top-level configuration, one section per tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Volatile in-memory tier.
    pub memory: MemoryTierConfig,

    /// Persistent file tier.
    pub file: FileTierConfig,

    /// Remote web service tier.
    pub web: WebTierConfig,
}

/// In-memory tier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryTierConfig {
    /// Seconds before a stored value goes stale (0 = never).
    pub expiration_secs: u64,
}

impl Default for MemoryTierConfig {
    fn default() -> Self {
        Self {
            expiration_secs: 60 * 60, // 1 hour
        }
    }
}

/// File tier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTierConfig {
    /// JSON file the value is persisted to.
    pub path: PathBuf,

    /// Seconds after the file's last modification before it goes stale (0 = never).
    pub expiration_secs: u64,
}

impl Default for FileTierConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("exchange_rate_list.json"),
            expiration_secs: 4 * 60 * 60, // 4 hours
        }
    }
}

/// Web tier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebTierConfig {
    /// Endpoint returning the payload as JSON.
    pub url: String,

    /// Access token sent as the `app_id` query parameter.
    pub app_id: Option<String>,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for WebTierConfig {
    fn default() -> Self {
        Self {
            url: "https://openexchangerates.org/api/latest.json".to_string(),
            app_id: None,
            request_timeout_secs: 10,
        }
    }
}

impl MemoryTierConfig {
    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_secs)
    }
}

impl FileTierConfig {
    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_secs)
    }
}

impl WebTierConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Load configuration from a JSON file, falling back to defaults for missing fields.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let config = if path.exists() {
            let data = std::fs::read_to_string(path)?;
            serde_json::from_str(&data)?
        } else {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            Config::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot produce a working chain.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.file.path.as_os_str().is_empty(),
            "file.path must not be empty"
        );
        anyhow::ensure!(!self.web.url.is_empty(), "web.url must not be empty");
        anyhow::ensure!(
            self.web.request_timeout_secs > 0,
            "web.request_timeout_secs must be greater than zero"
        );
        Ok(())
    }

    /// Apply command-line overrides.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(app_id) = &cli.app_id {
            self.web.app_id = Some(app_id.clone());
        }
    }
}
