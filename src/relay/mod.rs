use crate::bus::{Envelope, MessageSender};
use crate::config::Verbosity;
use crate::content::ContentScript;
use crate::events::TabUpdate;
use crate::platform::{NativeMessenger, ScriptInjector};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};

#[cfg(test)]
mod tests;

/// Captures finished pages and forwards them to a native host
///
/// Both listeners return immediately. The injection and the native send run
/// as separate tasks and every failure ends inside that task. [`run`] keeps
/// the tasks it starts and waits for them before returning.
///
/// [`run`]: NavigationRelay::run
#[derive(Clone)]
pub struct NavigationRelay {
    injector: Arc<dyn ScriptInjector>,
    messenger: Arc<dyn NativeMessenger>,
    host_name: Arc<str>,
    verbosity: Verbosity,
}

impl NavigationRelay {
    /// Create a relay forwarding to the native host `host_name`
    pub fn new(
        injector: Arc<dyn ScriptInjector>,
        messenger: Arc<dyn NativeMessenger>,
        host_name: &str,
    ) -> Self {
        Self {
            injector,
            messenger,
            host_name: Arc::from(host_name),
            verbosity: Verbosity::default(),
        }
    }

    /// Set the logging policy
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    /// Tab update listener
    ///
    /// Starts one snapshot injection for a finished load and returns the
    /// task running it. Any other update is ignored and yields `None`.
    pub fn on_tab_updated(&self, update: TabUpdate) -> Option<JoinHandle<()>> {
        self.injection(update).map(tokio::spawn)
    }

    /// Bus message listener
    ///
    /// Forwards the message unchanged to the native host and returns the task
    /// doing so. The host's response is only logged.
    pub fn on_message(&self, message: serde_json::Value, sender: MessageSender) -> JoinHandle<()> {
        tokio::spawn(self.forwarding(message, sender))
    }

    /// The injection a tab update calls for, if any
    fn injection(&self, update: TabUpdate) -> Option<impl Future<Output = ()> + Send + use<>> {
        if !update.is_complete() {
            if self.verbosity.is_verbose() {
                ::log::trace!(
                    "Ignoring update for tab {} with status {:?}",
                    update.tab_id,
                    update.change_info.status
                );
            }
            return None;
        }

        if self.verbosity.is_verbose() {
            ::log::info!("Tab updated, injecting script into: {}", update.tab.url);
        }

        let injector = Arc::clone(&self.injector);
        let verbosity = self.verbosity;
        Some(async move {
            if let Err(e) = injector
                .inject(update.tab_id, ContentScript::PageSnapshot)
                .await
            {
                if verbosity.is_verbose() {
                    ::log::error!("Script injection failed: {}", e);
                }
            }
        })
    }

    /// The native send for one bus message
    fn forwarding(
        &self,
        message: serde_json::Value,
        sender: MessageSender,
    ) -> impl Future<Output = ()> + Send + use<> {
        if self.verbosity.is_verbose() {
            ::log::info!("Received message from content script: {}", message);
            ::log::debug!("Message sender: {:?}", sender);
        }

        let messenger = Arc::clone(&self.messenger);
        let host_name = Arc::clone(&self.host_name);
        let verbosity = self.verbosity;
        async move {
            match messenger.send_native_message(&host_name, &message).await {
                Ok(response) => {
                    if verbosity.is_verbose() {
                        ::log::info!("Native message response: {}", response);
                    }
                }
                Err(e) => {
                    if verbosity.is_verbose() {
                        ::log::error!("Native messaging error: {}", e);
                    }
                }
            }
        }
    }

    /// Dispatch tab updates and bus messages until `shutdown` resolves
    ///
    /// Also stops once both channels are closed. Before returning, waits for
    /// every injection and native send it started, and forwards the snapshots
    /// those injections still produce. No new tab updates are taken then.
    pub async fn run<F>(
        &self,
        mut events: mpsc::Receiver<TabUpdate>,
        mut bus: mpsc::Receiver<Envelope>,
        shutdown: F,
    ) where
        F: Future<Output = ()>,
    {
        ::log::info!("Navigation relay forwarding to native host {}", self.host_name);
        tokio::pin!(shutdown);

        let mut in_flight = JoinSet::new();
        let mut events_open = true;
        let mut bus_open = true;

        while events_open || bus_open {
            tokio::select! {
                _ = &mut shutdown => {
                    ::log::info!("Navigation relay shutting down");
                    break;
                }
                update = events.recv(), if events_open => match update {
                    Some(update) => {
                        if let Some(injection) = self.injection(update) {
                            in_flight.spawn(injection);
                        }
                    }
                    None => {
                        ::log::debug!("Tab event stream closed");
                        events_open = false;
                    }
                },
                envelope = bus.recv(), if bus_open => match envelope {
                    Some(Envelope { message, sender }) => {
                        in_flight.spawn(self.forwarding(message, sender));
                    }
                    None => {
                        ::log::debug!("Message bus closed");
                        bus_open = false;
                    }
                },
                Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
            }
        }

        self.drain(&mut in_flight, &mut bus).await;
        ::log::info!("Navigation relay stopped");
    }

    /// Wait for in-flight work, forwarding whatever it still posts on the bus
    async fn drain(&self, in_flight: &mut JoinSet<()>, bus: &mut mpsc::Receiver<Envelope>) {
        if !in_flight.is_empty() {
            ::log::info!("Waiting for {} in-flight operations", in_flight.len());
        }

        loop {
            tokio::select! {
                biased;
                Some(Envelope { message, sender }) = bus.recv() => {
                    in_flight.spawn(self.forwarding(message, sender));
                }
                joined = in_flight.join_next() => {
                    if joined.is_none() {
                        break;
                    }
                }
            }
        }
    }
}
