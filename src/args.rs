use clap::Parser;
use foxhole_relay::{RelayConfig, Verbosity};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "foxhole-relay")]
#[command(about = "Forwards finished browser pages to a native messaging host")]
#[command(version)]
pub struct Args {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// WebDriver endpoint of the browser to watch
    #[arg(short, long)]
    pub webdriver_url: Option<String>,

    /// Native messaging host receiving page snapshots
    #[arg(long)]
    pub host_name: Option<String>,

    /// Extension id presented to the native host
    #[arg(long)]
    pub extension_id: Option<String>,

    /// Directory containing native host manifests
    #[arg(long)]
    pub manifest_dir: Option<PathBuf>,

    /// Tab polling interval in milliseconds
    #[arg(long)]
    pub poll_interval_ms: Option<u64>,

    /// Drop failures silently instead of logging them
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply(&self, config: &mut RelayConfig) {
        if let Some(url) = &self.webdriver_url {
            config.webdriver_url = url.clone();
        }
        if let Some(host_name) = &self.host_name {
            config.host_name = host_name.clone();
        }
        if let Some(extension_id) = &self.extension_id {
            config.extension_id = extension_id.clone();
        }
        if let Some(dir) = &self.manifest_dir {
            config.manifest_dir = Some(dir.clone());
        }
        if let Some(interval) = self.poll_interval_ms {
            config.poll_interval_ms = interval;
        }
        if self.quiet {
            config.verbosity = Verbosity::Quiet;
        }
    }
}
