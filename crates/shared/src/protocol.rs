use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    CustomerId, LeadId, QuoteId, ReminderId, ReminderPriority, ReminderStatus, ReminderType,
    SuggestedAction, UserId, UserRole,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub reminder_type: ReminderType,
    pub priority: ReminderPriority,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub days_stale: u32,
    pub suggested_action: SuggestedAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<LeadId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_id: Option<QuoteId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_number: Option<String>,
    #[serde(default)]
    pub is_dismissed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismissed_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismissed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_acted_upon: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_taken: Option<SuggestedAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Reminder {
    pub fn status(&self) -> ReminderStatus {
        if self.is_dismissed {
            ReminderStatus::Dismissed
        } else if self.is_acted_upon {
            ReminderStatus::Acted
        } else {
            ReminderStatus::Open
        }
    }

    /// Best human label for the entity the reminder points at.
    pub fn subject(&self) -> String {
        if let Some(name) = &self.customer_name {
            return name.clone();
        }
        if let Some(number) = &self.quote_number {
            return format!("Quote {number}");
        }
        match (self.quote_id, self.lead_id, self.customer_id) {
            (Some(quote_id), _, _) => format!("Quote #{quote_id}"),
            (_, Some(lead_id), _) => format!("Lead #{lead_id}"),
            (_, _, Some(customer_id)) => format!("Customer #{customer_id}"),
            _ => "-".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleSummary {
    #[serde(default)]
    pub total_reminders: u64,
    #[serde(default)]
    pub urgent_count: u64,
    #[serde(default)]
    pub stale_leads: u64,
    #[serde(default)]
    pub stale_quotes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<ReminderPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_type: Option<ReminderType>,
    #[serde(default)]
    pub dismissed: bool,
}

impl ReminderFilter {
    pub fn open() -> Self {
        Self::default()
    }

    pub fn with_priority(mut self, priority: ReminderPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_type(mut self, reminder_type: ReminderType) -> Self {
        self.reminder_type = Some(reminder_type);
        self
    }

    pub fn matches(&self, reminder: &Reminder) -> bool {
        if reminder.is_dismissed != self.dismissed {
            return false;
        }
        if let Some(priority) = self.priority {
            if reminder.priority != priority {
                return false;
            }
        }
        if let Some(reminder_type) = self.reminder_type {
            if reminder.reminder_type != reminder_type {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DismissReminderRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActReminderRequest {
    pub action_taken: SuggestedAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateRemindersResponse {
    #[serde(default)]
    pub created: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: UserRole,
}
