use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use shared::{
    domain::{ReminderId, SuggestedAction},
    protocol::{
        ActReminderRequest, DismissReminderRequest, GenerateRemindersResponse, Reminder,
        ReminderFilter, StaleSummary,
    },
};
use tracing::{debug, info};

use crate::{error::ClientResult, transport::ApiTransport};

/// Backend operations on reminders. The board and the CLI only see this
/// trait, so tests can swap the HTTP implementation out.
#[async_trait]
pub trait ReminderApi: Send + Sync {
    async fn list_reminders(&self, filter: &ReminderFilter) -> ClientResult<Vec<Reminder>>;
    async fn stale_summary(&self) -> ClientResult<StaleSummary>;
    async fn dismiss(&self, id: ReminderId, reason: Option<&str>) -> ClientResult<()>;
    async fn act(
        &self,
        id: ReminderId,
        action: SuggestedAction,
        notes: Option<&str>,
    ) -> ClientResult<()>;
    async fn generate(&self) -> ClientResult<GenerateRemindersResponse>;
}

#[derive(Serialize)]
struct ListRemindersQuery {
    dismissed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reminder_type: Option<&'static str>,
}

impl From<&ReminderFilter> for ListRemindersQuery {
    fn from(filter: &ReminderFilter) -> Self {
        Self {
            dismissed: filter.dismissed,
            priority: filter.priority.map(|p| p.as_str()),
            reminder_type: filter.reminder_type.map(|t| t.as_str()),
        }
    }
}

#[derive(Clone)]
pub struct HttpReminderApi {
    transport: Arc<ApiTransport>,
}

impl HttpReminderApi {
    pub fn new(transport: Arc<ApiTransport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<ApiTransport> {
        &self.transport
    }
}

#[async_trait]
impl ReminderApi for HttpReminderApi {
    async fn list_reminders(&self, filter: &ReminderFilter) -> ClientResult<Vec<Reminder>> {
        let query = ListRemindersQuery::from(filter);
        let mut reminders: Vec<Reminder> = self.transport.get_json("/reminders", &query).await?;
        let fetched = reminders.len();
        // The backend owns filtering; re-check so a lenient backend cannot
        // leak dismissed or off-filter rows into the view.
        reminders.retain(|reminder| filter.matches(reminder));
        debug!(fetched, kept = reminders.len(), "listed reminders");
        Ok(reminders)
    }

    async fn stale_summary(&self) -> ClientResult<StaleSummary> {
        self.transport.get_json("/reminders/summary", &()).await
    }

    async fn dismiss(&self, id: ReminderId, reason: Option<&str>) -> ClientResult<()> {
        self.transport
            .post_unit(
                &format!("/reminders/{}/dismiss", id.0),
                &DismissReminderRequest {
                    reason: reason.map(str::to_string),
                },
            )
            .await?;
        info!(reminder_id = id.0, "dismissed reminder");
        Ok(())
    }

    async fn act(
        &self,
        id: ReminderId,
        action: SuggestedAction,
        notes: Option<&str>,
    ) -> ClientResult<()> {
        self.transport
            .post_unit(
                &format!("/reminders/{}/act", id.0),
                &ActReminderRequest {
                    action_taken: action,
                    notes: notes.map(str::to_string),
                },
            )
            .await?;
        info!(reminder_id = id.0, action = %action, "recorded reminder action");
        Ok(())
    }

    async fn generate(&self) -> ClientResult<GenerateRemindersResponse> {
        let response: GenerateRemindersResponse =
            self.transport.post_json("/reminders/generate", &()).await?;
        info!(created = response.created, "triggered reminder generation");
        Ok(response)
    }
}

#[cfg(test)]
#[path = "tests/reminders_tests.rs"]
mod tests;
