use crate::bus::BusHandle;
use crate::error::BrowserError;
use crate::events::{ChangeInfo, TabId, TabStatus, TabUpdate};
use fantoccini::Client;
use fantoccini::wd::WindowHandle;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};

/// Reads the load state and location of the current window
const READY_STATE_SCRIPT: &str = "return [document.readyState, window.location.href];";

/// Last observed state of one tab
#[derive(Debug, Clone)]
struct TrackedTab {
    tab_id: TabId,
    status: TabStatus,
    url: String,
}

/// Maps browser window handles to tab ids and remembers what each tab last reported
#[derive(Debug, Default)]
pub struct TabRegistry {
    next_id: u64,
    tabs: HashMap<String, TrackedTab>,
}

impl TabRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the observed state of the window `key`
    ///
    /// Returns an update when the tab is new or its status or URL changed.
    pub fn observe(&mut self, key: &str, ready_state: &str, url: &str) -> Option<TabUpdate> {
        let status = TabStatus::from_ready_state(ready_state);

        if let Some(tracked) = self.tabs.get_mut(key) {
            if tracked.status == status && tracked.url == url {
                return None;
            }
            let url_changed = tracked.url != url;
            tracked.status = status.clone();
            tracked.url = url.to_string();

            let change_info = ChangeInfo {
                status: Some(status),
                url: url_changed.then(|| url.to_string()),
            };
            return Some(TabUpdate::new(tracked.tab_id, change_info, url));
        }

        self.next_id += 1;
        let tab_id = TabId(self.next_id);
        ::log::debug!("Tracking new tab {} for window {}", tab_id, key);
        self.tabs.insert(
            key.to_string(),
            TrackedTab {
                tab_id,
                status: status.clone(),
                url: url.to_string(),
            },
        );

        let change_info = ChangeInfo {
            status: Some(status),
            url: Some(url.to_string()),
        };
        Some(TabUpdate::new(tab_id, change_info, url))
    }

    /// Forget every window not in `live`, returning the ids of closed tabs
    pub fn retain(&mut self, live: &HashSet<String>) -> Vec<TabId> {
        let mut closed = Vec::new();
        self.tabs.retain(|key, tracked| {
            let keep = live.contains(key);
            if !keep {
                closed.push(tracked.tab_id);
            }
            keep
        });
        closed
    }

    pub fn tab_id(&self, key: &str) -> Option<TabId> {
        self.tabs.get(key).map(|t| t.tab_id)
    }

    /// Last URL observed for a tab
    pub fn url(&self, tab_id: TabId) -> Option<&str> {
        self.tabs
            .values()
            .find(|t| t.tab_id == tab_id)
            .map(|t| t.url.as_str())
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }
}

/// Tab bookkeeping shared between the watcher and the injector
#[derive(Debug, Default)]
pub(super) struct TabState {
    pub(super) registry: TabRegistry,
    pub(super) handles: HashMap<TabId, WindowHandle>,
}

/// The tabs of one WebDriver session
///
/// Switching windows changes session-wide state, so every switch and the
/// script execution that follows it happen under `session`.
pub struct BrowserTabs {
    pub(super) client: Client,
    pub(super) bus: BusHandle,
    pub(super) session: Mutex<()>,
    pub(super) state: std::sync::Mutex<TabState>,
}

impl BrowserTabs {
    /// Track the tabs of `client`, posting content script results to `bus`
    pub fn new(client: Client, bus: BusHandle) -> Self {
        Self {
            client,
            bus,
            session: Mutex::new(()),
            state: std::sync::Mutex::new(TabState::default()),
        }
    }

    /// Read every open window once and return the resulting tab updates
    pub async fn poll(&self) -> Result<Vec<TabUpdate>, BrowserError> {
        let _session = self.session.lock().await;

        let windows = self.client.windows().await?;
        let live: HashSet<String> = windows.iter().cloned().map(String::from).collect();
        {
            let mut state = self.lock_state();
            for tab_id in state.registry.retain(&live) {
                ::log::debug!("Tab {} closed", tab_id);
                state.handles.remove(&tab_id);
            }
        }

        let mut updates = Vec::new();
        for handle in windows {
            let key = String::from(handle.clone());
            let (ready_state, url) = match self.read_ready_state(handle.clone()).await {
                Ok(observed) => observed,
                Err(e) => {
                    ::log::trace!("Skipping window {} this round: {}", key, e);
                    continue;
                }
            };

            let mut state = self.lock_state();
            if let Some(update) = state.registry.observe(&key, &ready_state, &url) {
                state.handles.insert(update.tab_id, handle);
                updates.push(update);
            }
        }

        Ok(updates)
    }

    /// Poll the browser every `interval`, sending tab updates until `events` is dropped
    pub async fn watch(self: Arc<Self>, interval: Duration, events: mpsc::Sender<TabUpdate>) {
        ::log::info!("Watching browser tabs every {:?}", interval);
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if events.is_closed() {
                break;
            }

            match self.poll().await {
                Ok(updates) => {
                    for update in updates {
                        ::log::trace!("Tab {} update {:?}", update.tab_id, update.change_info);
                        if events.send(update).await.is_err() {
                            ::log::debug!("Tab event receiver dropped, stopping watcher");
                            return;
                        }
                    }
                }
                Err(e) => {
                    ::log::warn!("Failed to poll browser tabs: {}", e);
                }
            }
        }

        ::log::debug!("Tab watcher stopped");
    }

    /// End the WebDriver session
    pub async fn close(&self) {
        if let Err(e) = self.client.clone().close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }
    }

    /// Switch to `handle` and read its ready state and location
    ///
    /// Callers must hold `session`.
    async fn read_ready_state(&self, handle: WindowHandle) -> Result<(String, String), BrowserError> {
        self.client.switch_to_window(handle).await?;
        let value = self.client.execute(READY_STATE_SCRIPT, Vec::new()).await?;

        let field = |i: usize| {
            value
                .get(i)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string()
        };
        Ok((field(0), field(1)))
    }

    pub(super) fn lock_state(&self) -> std::sync::MutexGuard<'_, TabState> {
        // State updates never panic midway, so a poisoned lock still holds consistent data
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_window_gets_an_update_and_id() {
        let mut registry = TabRegistry::new();

        let update = registry.observe("w1", "loading", "https://a").unwrap();
        assert_eq!(update.tab_id, TabId(1));
        assert_eq!(update.change_info.status, Some(TabStatus::Loading));
        assert_eq!(update.change_info.url.as_deref(), Some("https://a"));
        assert_eq!(update.tab.url, "https://a");

        let update = registry.observe("w2", "complete", "https://b").unwrap();
        assert_eq!(update.tab_id, TabId(2));
        assert!(update.is_complete());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_updates_only_on_change() {
        let mut registry = TabRegistry::new();
        registry.observe("w1", "loading", "https://a");

        // interactive is still loading
        assert!(registry.observe("w1", "interactive", "https://a").is_none());

        let update = registry.observe("w1", "complete", "https://a").unwrap();
        assert!(update.is_complete());
        assert_eq!(update.change_info.url, None);

        assert!(registry.observe("w1", "complete", "https://a").is_none());

        // Navigation between polls that already finished loading
        let update = registry.observe("w1", "complete", "https://a/next").unwrap();
        assert!(update.is_complete());
        assert_eq!(update.change_info.url.as_deref(), Some("https://a/next"));
        assert_eq!(update.tab_id, TabId(1));
        assert_eq!(registry.url(TabId(1)), Some("https://a/next"));
    }

    #[test]
    fn test_closed_windows_are_forgotten_and_ids_not_reused() {
        let mut registry = TabRegistry::new();
        registry.observe("w1", "complete", "https://a");
        registry.observe("w2", "complete", "https://b");

        let live: HashSet<String> = ["w2".to_string()].into_iter().collect();
        assert_eq!(registry.retain(&live), vec![TabId(1)]);
        assert_eq!(registry.tab_id("w1"), None);
        assert_eq!(registry.tab_id("w2"), Some(TabId(2)));
        assert_eq!(registry.url(TabId(1)), None);

        // A window reappearing under the same handle is a new tab
        let update = registry.observe("w1", "complete", "https://a").unwrap();
        assert_eq!(update.tab_id, TabId(3));

        assert_eq!(registry.retain(&HashSet::new()).len(), 2);
        assert!(registry.is_empty());
    }
}
