//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::batch::BatchOptions;
use crate::ebay::client::Transport;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// eBay application id (required to issue calls)
    #[serde(default)]
    pub app_id: String,

    /// Wire transport: padded JSON or plain JSON
    #[serde(default)]
    pub mode: Transport,

    /// Base URL replacing both the Shopping and Finding endpoints
    #[serde(default)]
    pub base_url: Option<String>,

    /// Proxy URL (e.g., socks5://host:port)
    #[serde(default)]
    pub proxy: Option<String>,

    /// Per-request HTTP timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Connect timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Upper bound for one batch member including retries (0 disables)
    #[serde(default = "default_batch_timeout_ms")]
    pub batch_timeout_ms: u64,

    /// Extra attempts after a transient failure
    #[serde(default)]
    pub retries: u32,

    /// Base delay between attempts in milliseconds
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Random jitter added to the retry delay (0 to this value)
    #[serde(default = "default_retry_jitter_ms")]
    pub retry_jitter_ms: u64,

    /// Maximum requests in flight per batch (0 = unlimited)
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_batch_timeout_ms() -> u64 {
    30_000
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_retry_jitter_ms() -> u64 {
    250
}

fn default_max_concurrency() -> usize {
    8
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            mode: Transport::Jsonp,
            base_url: None,
            proxy: None,
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            batch_timeout_ms: default_batch_timeout_ms(),
            retries: 0,
            retry_backoff_ms: default_retry_backoff_ms(),
            retry_jitter_ms: default_retry_jitter_ms(),
            max_concurrency: default_max_concurrency(),
            format: OutputFormat::Pretty,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        let local_config = Path::new("config.toml");
        if local_config.exists() {
            debug!("Found config.toml in current directory");
            return Self::from_file(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("ebay-catalog").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(app_id) = std::env::var("EBAY_APP_ID") {
            self.app_id = app_id;
        }

        if let Ok(mode) = std::env::var("EBAY_MODE") {
            if let Ok(m) = mode.parse() {
                self.mode = m;
            }
        }

        if let Ok(base_url) = std::env::var("EBAY_BASE_URL") {
            self.base_url = Some(base_url);
        }

        if let Ok(proxy) = std::env::var("EBAY_PROXY") {
            self.proxy = Some(proxy);
        }

        if let Ok(timeout) = std::env::var("EBAY_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.timeout_ms = t;
            }
        }

        self
    }

    /// Limits handed to the batch aggregator.
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            timeout: (self.batch_timeout_ms > 0)
                .then(|| Duration::from_millis(self.batch_timeout_ms)),
            max_concurrency: (self.max_concurrency > 0).then_some(self.max_concurrency),
        }
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
    Ndjson,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(OutputFormat::Pretty),
            "json" => Ok(OutputFormat::Json),
            "ndjson" | "jsonl" => Ok(OutputFormat::Ndjson),
            _ => Err(format!("Unknown format: {}. Use: pretty, json, ndjson", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Pretty => write!(f, "pretty"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Ndjson => write!(f, "ndjson"),
        }
    }
}
