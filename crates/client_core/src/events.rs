use shared::protocol::StaleSummary;
use tokio::sync::broadcast;

use crate::dispatch::NavigationTarget;

#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    RemindersUpdated { count: usize },
    SummaryUpdated(StaleSummary),
    /// Transient user-facing message (toast).
    Notification(String),
    /// A request came back 401; the token has been cleared.
    LoginRequired,
    Navigate(NavigationTarget),
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ClientEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    pub fn emit(&self, event: ClientEvent) {
        // No subscribers is fine: nobody is rendering.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.tx.subscribe()
    }
}
