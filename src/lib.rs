// Re-export modules
pub mod browser;
pub mod bus;
pub mod config;
pub mod content;
pub mod error;
pub mod events;
pub mod native;
pub mod platform;
pub mod relay;
pub mod snapshot;

// Re-export commonly used types for convenience
pub use config::{RelayConfig, Verbosity};
pub use error::RelayError;
pub use relay::NavigationRelay;
pub use snapshot::PageSnapshot;

use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Main builder for running the relay against a live browser
pub struct Relay {
    config: RelayConfig,
}

impl Relay {
    /// Create a new Relay builder with default settings
    pub fn new() -> Self {
        Self {
            config: RelayConfig::default(),
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: RelayConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from a file
    pub fn with_config_file(self, path: impl AsRef<std::path::Path>) -> Result<Self, RelayError> {
        let config = RelayConfig::from_file(path)?;
        Ok(self.with_config(config))
    }

    /// Load configuration from a string
    pub fn with_config_str(self, config_str: &str) -> Result<Self, RelayError> {
        let config = RelayConfig::from_json(config_str)?;
        Ok(self.with_config(config))
    }

    /// Set the WebDriver endpoint
    pub fn with_webdriver_url(mut self, url: impl Into<String>) -> Self {
        self.config.webdriver_url = url.into();
        self
    }

    /// Set the native host snapshots are forwarded to
    pub fn with_host_name(mut self, host_name: impl Into<String>) -> Self {
        self.config.host_name = host_name.into();
        self
    }

    /// Set the extension id presented to the native host
    pub fn with_extension_id(mut self, extension_id: impl Into<String>) -> Self {
        self.config.extension_id = extension_id.into();
        self
    }

    /// Look for host manifests in this directory only
    pub fn with_manifest_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.config.manifest_dir = Some(dir.into());
        self
    }

    /// Set the tab polling interval
    pub fn with_poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.config.poll_interval_ms = interval_ms;
        self
    }

    /// Set the logging policy
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.config.verbosity = verbosity;
        self
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Connect to the browser and relay pages until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<(), RelayError>
    where
        F: Future<Output = ()>,
    {
        let config = self.config;
        let client = browser::connect(&config.webdriver_url).await?;

        let (bus, bus_rx) = bus::channel(config.bus_capacity);
        let tabs = Arc::new(browser::BrowserTabs::new(client, bus));
        let messenger = Arc::new(native::StdioNativeMessenger::from_config(&config));

        let relay = NavigationRelay::new(tabs.clone(), messenger, &config.host_name)
            .with_verbosity(config.verbosity);

        let (events_tx, events_rx) = mpsc::channel(config.bus_capacity.max(1));
        let watcher = tokio::spawn(Arc::clone(&tabs).watch(config.poll_interval(), events_tx));

        // Returns only after in-flight injections and sends have finished
        relay.run(events_rx, bus_rx, shutdown).await;

        watcher.abort();
        tabs.close().await;
        Ok(())
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}
