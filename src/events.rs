use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use url::Url;

/// Status value that marks a finished load
pub const STATUS_COMPLETE: &str = "complete";

/// URL schemes content scripts are never allowed to run in
const PRIVILEGED_SCHEMES: &[&str] = &[
    "about",
    "chrome",
    "chrome-extension",
    "moz-extension",
    "resource",
    "view-source",
    "jar",
];

/// Identity of a browser tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Load status reported with a tab update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabStatus {
    Loading,
    Complete,
    Other(String),
}

impl TabStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TabStatus::Loading => "loading",
            TabStatus::Complete => STATUS_COMPLETE,
            TabStatus::Other(s) => s,
        }
    }

    /// Map a `document.readyState` value onto a tab status
    pub fn from_ready_state(state: &str) -> Self {
        if state == STATUS_COMPLETE {
            TabStatus::Complete
        } else {
            TabStatus::Loading
        }
    }
}

impl From<&str> for TabStatus {
    fn from(s: &str) -> Self {
        match s {
            "loading" => TabStatus::Loading,
            STATUS_COMPLETE => TabStatus::Complete,
            other => TabStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for TabStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for TabStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TabStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(TabStatus::from(s.as_str()))
    }
}

/// Properties of a tab that changed in an update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TabStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ChangeInfo {
    pub fn with_status(status: TabStatus) -> Self {
        Self {
            status: Some(status),
            url: None,
        }
    }
}

/// State of the tab at the time of an update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabInfo {
    pub url: String,
}

impl TabInfo {
    /// Whether a content script may run in this tab's page
    pub fn is_scriptable(&self) -> bool {
        match Url::parse(&self.url) {
            Ok(url) => !PRIVILEGED_SCHEMES.contains(&url.scheme()),
            Err(_) => false,
        }
    }
}

/// A tab lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabUpdate {
    pub tab_id: TabId,
    pub change_info: ChangeInfo,
    pub tab: TabInfo,
}

impl TabUpdate {
    pub fn new(tab_id: TabId, change_info: ChangeInfo, url: impl Into<String>) -> Self {
        Self {
            tab_id,
            change_info,
            tab: TabInfo { url: url.into() },
        }
    }

    /// True when this update reports a finished load
    pub fn is_complete(&self) -> bool {
        matches!(self.change_info.status, Some(TabStatus::Complete))
    }
}
