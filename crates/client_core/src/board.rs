//! State behind the reminder list view: the ranked rows, the active filter,
//! the summary counters and the reminders with a mutation still in flight.

use std::collections::HashSet;

use shared::{
    domain::{ReminderId, SuggestedAction},
    protocol::{Reminder, ReminderFilter, StaleSummary},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    dispatch::{navigation_target, DispatchOutcome},
    error::{ClientError, ClientResult},
    events::{ClientEvent, EventBus},
    ranking,
    reminders::ReminderApi,
};

#[derive(Default)]
struct BoardState {
    filter: ReminderFilter,
    reminders: Vec<Reminder>,
    summary: Option<StaleSummary>,
    pending: HashSet<ReminderId>,
    /// Handed out to each refresh when it starts.
    next_generation: u64,
    /// Generation of the refresh whose rows are on screen.
    applied_generation: u64,
}

pub struct ReminderBoard<A: ReminderApi> {
    api: A,
    events: EventBus,
    state: Mutex<BoardState>,
}

impl<A: ReminderApi> ReminderBoard<A> {
    pub fn new(api: A, events: EventBus) -> Self {
        Self::with_filter(api, events, ReminderFilter::open())
    }

    pub fn with_filter(api: A, events: EventBus, filter: ReminderFilter) -> Self {
        Self {
            api,
            events,
            state: Mutex::new(BoardState {
                filter,
                ..BoardState::default()
            }),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn reminders(&self) -> Vec<Reminder> {
        self.state.lock().await.reminders.clone()
    }

    pub async fn summary(&self) -> Option<StaleSummary> {
        self.state.lock().await.summary.clone()
    }

    pub async fn filter(&self) -> ReminderFilter {
        self.state.lock().await.filter.clone()
    }

    pub async fn is_pending(&self, id: ReminderId) -> bool {
        self.state.lock().await.pending.contains(&id)
    }

    /// Refetches with the active filter. On failure the previous rows stay.
    /// A refresh that finishes after a later one has already applied, or
    /// after the filter changed, is discarded.
    pub async fn refresh(&self) -> ClientResult<Vec<Reminder>> {
        let (filter, generation) = {
            let mut guard = self.state.lock().await;
            guard.next_generation += 1;
            (guard.filter.clone(), guard.next_generation)
        };

        let fetched = match self.api.list_reminders(&filter).await {
            Ok(reminders) => ranking::ranked(reminders),
            Err(err) => {
                self.notify(&err);
                return Err(err);
            }
        };

        let summary = match self.api.stale_summary().await {
            Ok(summary) => Some(summary),
            Err(err) => {
                warn!(error = %err, "failed to refresh stale summary");
                None
            }
        };

        {
            let mut guard = self.state.lock().await;
            if guard.filter != filter || guard.applied_generation > generation {
                debug!(generation, "discarding superseded refresh");
                return Ok(guard.reminders.clone());
            }
            guard.applied_generation = generation;
            guard.reminders = fetched.clone();
            if let Some(summary) = summary.clone() {
                guard.summary = Some(summary);
            }
        }

        self.events.emit(ClientEvent::RemindersUpdated {
            count: fetched.len(),
        });
        if let Some(summary) = summary {
            self.events.emit(ClientEvent::SummaryUpdated(summary));
        }
        Ok(fetched)
    }

    /// Swaps the filter without fetching; the next refresh uses it.
    pub async fn replace_filter(&self, filter: ReminderFilter) {
        self.state.lock().await.filter = filter;
    }

    pub async fn set_filter(&self, filter: ReminderFilter) -> ClientResult<Vec<Reminder>> {
        self.replace_filter(filter).await;
        self.refresh().await
    }

    pub async fn dismiss(&self, id: ReminderId, reason: Option<&str>) -> ClientResult<()> {
        self.begin(id).await?;
        let result = self.api.dismiss(id, reason).await;
        self.settle(id, result).await
    }

    pub async fn act(
        &self,
        id: ReminderId,
        action: SuggestedAction,
        notes: Option<&str>,
    ) -> ClientResult<()> {
        self.begin(id).await?;
        let result = self.api.act(id, action, notes).await;
        self.settle(id, result).await
    }

    /// Navigates to the entity behind the reminder's suggested action and
    /// records that action on the backend, refetching once it has settled.
    pub async fn dispatch(&self, id: ReminderId) -> ClientResult<DispatchOutcome> {
        let reminder = {
            let guard = self.state.lock().await;
            guard
                .reminders
                .iter()
                .find(|reminder| reminder.id == id)
                .cloned()
        }
        .ok_or(ClientError::UnknownReminder(id))?;

        let action = reminder.suggested_action;
        let target = navigation_target(&reminder, action);
        match target {
            Some(target) => self.events.emit(ClientEvent::Navigate(target)),
            None => warn!(
                reminder_id = id.0,
                action = %action,
                "reminder has no entity to open for its suggested action"
            ),
        }

        self.act(id, action, None).await?;
        Ok(DispatchOutcome {
            reminder_id: id,
            action,
            target,
        })
    }

    async fn begin(&self, id: ReminderId) -> ClientResult<()> {
        let mut guard = self.state.lock().await;
        if !guard.pending.insert(id) {
            return Err(ClientError::InFlight(id));
        }
        Ok(())
    }

    /// Once the backend has accepted the change the call succeeds; a failed
    /// refetch only surfaces as a notification from `refresh`.
    async fn settle(&self, id: ReminderId, result: ClientResult<()>) -> ClientResult<()> {
        self.state.lock().await.pending.remove(&id);
        match result {
            Ok(()) => {
                info!(reminder_id = id.0, "reminder updated; refetching");
                if let Err(err) = self.refresh().await {
                    debug!(reminder_id = id.0, error = %err, "refetch after update failed");
                }
                Ok(())
            }
            Err(err) => {
                self.notify(&err);
                Err(err)
            }
        }
    }

    fn notify(&self, err: &ClientError) {
        warn!(error = %err, "reminder request failed");
        if !err.requires_login() {
            self.events
                .emit(ClientEvent::Notification(err.notification_text()));
        }
    }
}

#[cfg(test)]
#[path = "tests/board_tests.rs"]
mod tests;
