use crate::content::ContentScript;
use crate::error::{InjectionError, NativeMessagingError};
use crate::events::TabId;
use async_trait::async_trait;

/// Runs bundled content scripts inside browser tabs
///
/// Implementations deliver whatever the script produces to the message bus
/// they were built with. A successful return means the script ran and its
/// result was posted.
#[async_trait]
pub trait ScriptInjector: Send + Sync {
    async fn inject(&self, tab_id: TabId, script: ContentScript) -> Result<(), InjectionError>;
}

/// Sends one-shot messages to a native messaging host
#[async_trait]
pub trait NativeMessenger: Send + Sync {
    async fn send_native_message(
        &self,
        host: &str,
        message: &serde_json::Value,
    ) -> Result<serde_json::Value, NativeMessagingError>;
}
