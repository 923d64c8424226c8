use crate::events::TabId;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single content-script injection
#[derive(Debug, Error)]
pub enum InjectionError {
    /// The tab closed or was never seen by the watcher
    #[error("tab {0} is gone")]
    TabGone(TabId),

    /// The tab shows a page extensions may not script
    #[error("tab {tab_id} shows a privileged page: {url}")]
    Privileged { tab_id: TabId, url: String },

    /// The browser refused to switch to or script the tab
    #[error("injection into tab {tab_id} blocked: {reason}")]
    Blocked { tab_id: TabId, reason: String },

    /// The WebDriver session ended or the connection to it dropped
    #[error("browser session lost while injecting into tab {tab_id}: {reason}")]
    SessionLost { tab_id: TabId, reason: String },

    /// The content script threw inside the page
    #[error("content script failed in tab {tab_id}: {reason}")]
    Script { tab_id: TabId, reason: String },

    /// The content script returned something other than a page snapshot
    #[error("content script in tab {tab_id} returned a malformed result: {source}")]
    MalformedResult {
        tab_id: TabId,
        #[source]
        source: serde_json::Error,
    },

    /// Nobody is listening on the message bus anymore
    #[error("message bus closed")]
    BusClosed,
}

/// Failure of a single native message exchange
#[derive(Debug, Error)]
pub enum NativeMessagingError {
    #[error("no manifest found for native host {0}")]
    HostNotFound(String),

    #[error("invalid host manifest {path}: {reason}")]
    InvalidManifest { path: PathBuf, reason: String },

    #[error("native host {host} does not allow extension {extension_id}")]
    NotPermitted { host: String, extension_id: String },

    #[error("failed to start native host {host}: {source}")]
    Spawn {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("native messaging IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("native messaging JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("native message of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: u64, max: u64 },

    #[error("native host {0} exited without responding")]
    Disconnected(String),
}

/// WebDriver session errors
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("no WebDriver server reachable (tried {0} and fallbacks)")]
    Unreachable(String),

    #[error("WebDriver command failed: {0}")]
    Command(#[from] fantoccini::error::CmdError),
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that stop the relay from starting
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Browser(#[from] BrowserError),
}
