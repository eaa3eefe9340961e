//! Client core for the CRM's stale-item reminders: session and transport
//! plumbing, the fetch/rank/dispatch pipeline, and the list-view state that
//! front-ends render.

use std::sync::Arc;

pub mod board;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod poller;
pub mod ranking;
pub mod reminders;
pub mod session;
pub mod transport;

pub use board::ReminderBoard;
pub use config::{load_settings, Settings};
pub use dispatch::{action_target, navigation_target, DispatchOutcome, NavigationTarget};
pub use error::{ClientError, ClientResult};
pub use events::{ClientEvent, EventBus};
pub use poller::{PollStats, Poller};
pub use reminders::{HttpReminderApi, ReminderApi};
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore};
pub use transport::ApiTransport;

/// Everything a front-end needs, wired from one set of settings.
pub struct CrmClient {
    pub settings: Settings,
    pub events: EventBus,
    pub transport: Arc<ApiTransport>,
    pub board: Arc<ReminderBoard<HttpReminderApi>>,
}

impl CrmClient {
    pub fn connect(settings: Settings) -> ClientResult<Self> {
        let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(settings.token_path.clone()));
        let session = Arc::new(Session::restore(store)?);
        Self::with_session(settings, session)
    }

    pub fn with_session(settings: Settings, session: Arc<Session>) -> ClientResult<Self> {
        let events = EventBus::new();
        let transport = Arc::new(ApiTransport::new(&settings, session, events.clone())?);
        let board = Arc::new(ReminderBoard::new(
            HttpReminderApi::new(Arc::clone(&transport)),
            events.clone(),
        ));
        Ok(Self {
            settings,
            events,
            transport,
            board,
        })
    }

    /// Polls the board at the configured interval until the poller is
    /// stopped or dropped.
    pub fn watch(&self) -> Poller {
        let board = Arc::clone(&self.board);
        Poller::spawn(self.settings.poll_interval(), move || {
            let board = Arc::clone(&board);
            async move { board.refresh().await.map(|_| ()) }
        })
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
