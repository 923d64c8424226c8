use super::fakes::{FakeHost, FakeTabs};
use super::log_capture::{self, contains};
use crate::bus::{self, MessageSender};
use crate::config::Verbosity;
use crate::error::NativeMessagingError;
use crate::events::{ChangeInfo, TabId, TabStatus, TabUpdate};
use crate::relay::NavigationRelay;
use log::Level;
use serde_json::json;
use std::sync::Arc;

fn update(tab_id: u64, status: TabStatus) -> TabUpdate {
    TabUpdate::new(TabId(tab_id), ChangeInfo::with_status(status), "https://a")
}

/// Relay whose injections fail (no open tabs) and whose host fails once
fn failing_relay(verbosity: Verbosity) -> (NavigationRelay, Arc<FakeHost>) {
    let (bus, _bus_rx) = bus::channel(8);
    let host = Arc::new(FakeHost::new());
    host.fail_next(NativeMessagingError::HostNotFound("foxhole_host".to_string()));
    let relay = NavigationRelay::new(Arc::new(FakeTabs::new(bus)), host.clone(), "foxhole_host")
        .with_verbosity(verbosity);
    (relay, host)
}

/// Ignored update, failed injection, failed native send
async fn exercise(relay: &NavigationRelay) {
    assert!(relay.on_tab_updated(update(1, TabStatus::Loading)).is_none());
    relay
        .on_tab_updated(update(1, TabStatus::Complete))
        .expect("complete update should start an injection")
        .await
        .unwrap();
    relay
        .on_message(json!({"title": "A"}), MessageSender::tab(TabId(1), "https://a"))
        .await
        .unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_quiet_relay_logs_nothing_per_event() {
        log_capture::start();
        let (relay, host) = failing_relay(Verbosity::Quiet);

        exercise(&relay).await;

        let records = log_capture::take();
        assert!(records.is_empty(), "quiet relay logged {records:?}");
        // The send itself still happened
        assert_eq!(host.received().len(), 1);
    }

    #[tokio::test]
    async fn test_verbose_relay_logs_failures_at_error() {
        log_capture::start();
        let (relay, _host) = failing_relay(Verbosity::Verbose);

        exercise(&relay).await;

        let records = log_capture::take();
        assert!(contains(&records, Level::Trace, "Ignoring update for tab 1"));
        assert!(contains(&records, Level::Info, "injecting script into: https://a"));
        assert!(contains(&records, Level::Error, "Script injection failed"));
        assert!(contains(&records, Level::Error, "Native messaging error"));
    }

    #[tokio::test]
    async fn test_verbose_relay_logs_host_response() {
        log_capture::start();
        let (bus, _bus_rx) = bus::channel(8);
        let relay = NavigationRelay::new(
            Arc::new(FakeTabs::new(bus)),
            Arc::new(FakeHost::new()),
            "foxhole_host",
        );

        relay
            .on_message(json!({"title": "A"}), MessageSender::tab(TabId(1), "https://a"))
            .await
            .unwrap();

        let records = log_capture::take();
        assert!(contains(&records, Level::Info, "Received message from content script"));
        assert!(contains(&records, Level::Info, r#"Native message response: {"ok":true}"#));
        assert!(!records.iter().any(|record| record.level == Level::Error));
    }
}
