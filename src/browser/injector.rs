use super::tabs::BrowserTabs;
use crate::bus::MessageSender;
use crate::content::ContentScript;
use crate::error::InjectionError;
use crate::events::{TabId, TabInfo};
use crate::platform::ScriptInjector;
use crate::snapshot::PageSnapshot;
use async_trait::async_trait;
use fantoccini::error::CmdError;

#[async_trait]
impl ScriptInjector for BrowserTabs {
    async fn inject(&self, tab_id: TabId, script: ContentScript) -> Result<(), InjectionError> {
        let (handle, url) = {
            let state = self.lock_state();
            let handle = state.handles.get(&tab_id).cloned();
            let url = state.registry.url(tab_id).map(str::to_string);
            match (handle, url) {
                (Some(handle), Some(url)) => (handle, url),
                _ => return Err(InjectionError::TabGone(tab_id)),
            }
        };

        let tab = TabInfo { url };
        if !tab.is_scriptable() {
            return Err(InjectionError::Privileged {
                tab_id,
                url: tab.url,
            });
        }

        ::log::debug!("Running {} in tab {} ({})", script.id(), tab_id, tab.url);
        let result = {
            let _session = self.session.lock().await;
            self.client
                .switch_to_window(handle)
                .await
                .map_err(|e| {
                    classify(tab_id, e, |reason| InjectionError::Blocked { tab_id, reason })
                })?;
            self.client
                .execute(script.source(), Vec::new())
                .await
                .map_err(|e| {
                    classify(tab_id, e, |reason| InjectionError::Script { tab_id, reason })
                })?
        };

        let snapshot = accept_snapshot(tab_id, result)?;
        let sender = MessageSender::tab(tab_id, snapshot.url.clone());
        self.bus.send_message(snapshot.to_message(), sender).await
    }
}

/// Sort a failed WebDriver command by what it says about the tab
///
/// A missing window means the tab closed; an invalid session or a dropped
/// connection means the whole browser is gone. Anything else goes to `other`.
fn classify(
    tab_id: TabId,
    error: CmdError,
    other: impl FnOnce(String) -> InjectionError,
) -> InjectionError {
    if error.is_no_such_window() {
        InjectionError::TabGone(tab_id)
    } else if error.is_invalid_session_id() || matches!(error, CmdError::Lost(_)) {
        InjectionError::SessionLost {
            tab_id,
            reason: error.to_string(),
        }
    } else {
        other(error.to_string())
    }
}

/// Decode a content script result, refusing pages that navigated somewhere
/// privileged since the last poll
fn accept_snapshot(
    tab_id: TabId,
    result: serde_json::Value,
) -> Result<PageSnapshot, InjectionError> {
    let snapshot = PageSnapshot::from_value(result)
        .map_err(|source| InjectionError::MalformedResult { tab_id, source })?;

    let tab = TabInfo {
        url: snapshot.url.clone(),
    };
    if !tab.is_scriptable() {
        return Err(InjectionError::Privileged {
            tab_id,
            url: tab.url,
        });
    }
    Ok(snapshot)
}
