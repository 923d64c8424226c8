use crate::error::InjectionError;
use crate::events::TabId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Describes the context a bus message came from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSender {
    /// Tab the message was sent from, if it came from a content script
    pub tab_id: Option<TabId>,

    /// URL of the sending document
    pub url: Option<String>,
}

impl MessageSender {
    pub fn tab(tab_id: TabId, url: impl Into<String>) -> Self {
        Self {
            tab_id: Some(tab_id),
            url: Some(url.into()),
        }
    }
}

/// A message in transit from a content context to the relay
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub message: serde_json::Value,
    pub sender: MessageSender,
}

/// Sending half of the message bus, handed to content-script platforms
#[derive(Debug, Clone)]
pub struct BusHandle {
    tx: mpsc::Sender<Envelope>,
}

impl BusHandle {
    /// Post a message to whoever listens on the bus
    pub async fn send_message(
        &self,
        message: serde_json::Value,
        sender: MessageSender,
    ) -> Result<(), InjectionError> {
        ::log::trace!("Bus message from {:?}", sender);
        self.tx
            .send(Envelope { message, sender })
            .await
            .map_err(|_| InjectionError::BusClosed)
    }
}

/// Create a message bus with room for `capacity` pending messages
pub fn channel(capacity: usize) -> (BusHandle, mpsc::Receiver<Envelope>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (BusHandle { tx }, rx)
}
