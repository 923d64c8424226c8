use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How much the relay reports about the pages it forwards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Log navigations, forwarded messages, host responses and failures
    #[default]
    Verbose,
    /// Drop failures silently and log nothing per event
    Quiet,
}

impl Verbosity {
    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Configuration for the navigation relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Name of the native messaging host snapshots are forwarded to
    #[serde(default = "default_host_name")]
    pub host_name: String,

    /// Extension id presented to the native host and checked against its manifest
    #[serde(default = "default_extension_id")]
    pub extension_id: String,

    /// Directory holding host manifests (platform default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_dir: Option<PathBuf>,

    /// Logging policy for relay events
    #[serde(default)]
    pub verbosity: Verbosity,

    /// How often the tab watcher polls the browser, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum number of undelivered messages on the bus
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

/// Default value for host_name
fn default_host_name() -> String {
    "foxhole_host".to_string()
}

/// Default value for extension_id
fn default_extension_id() -> String {
    "foxhole@localhost".to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_bus_capacity() -> usize {
    1024
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            webdriver_url: default_webdriver_url(),
            host_name: default_host_name(),
            extension_id: default_extension_id(),
            manifest_dir: None,
            verbosity: Verbosity::default(),
            poll_interval_ms: default_poll_interval_ms(),
            bus_capacity: default_bus_capacity(),
        }
    }
}

impl RelayConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Override the WebDriver URL with `WEBDRIVER_URL` if it is set
    pub fn apply_env(&mut self) {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            self.apply_webdriver_override(&webdriver_url);
        }
    }

    fn apply_webdriver_override(&mut self, webdriver_url: &str) {
        if !webdriver_url.is_empty() {
            ::log::debug!("Using WebDriver URL from environment: {}", webdriver_url);
            self.webdriver_url = webdriver_url.to_string();
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
