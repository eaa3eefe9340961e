use std::fmt;

use shared::{
    domain::{CustomerId, LeadId, QuoteId, ReminderId, SuggestedAction},
    protocol::Reminder,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationTarget {
    Customer(CustomerId),
    Lead(LeadId),
    Quote(QuoteId),
}

impl NavigationTarget {
    pub fn path(&self) -> String {
        match self {
            NavigationTarget::Customer(id) => format!("/customers/{id}"),
            NavigationTarget::Lead(id) => format!("/leads/{id}"),
            NavigationTarget::Quote(id) => format!("/quotes/{id}"),
        }
    }

    pub fn url(&self, web_base_url: &str) -> String {
        format!("{}{}", web_base_url.trim_end_matches('/'), self.path())
    }
}

impl fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationTarget::Customer(id) => write!(f, "customer {id}"),
            NavigationTarget::Lead(id) => write!(f, "lead {id}"),
            NavigationTarget::Quote(id) => write!(f, "quote {id}"),
        }
    }
}

/// Where `action` on `reminder` takes the user, or `None` when the entity id
/// the action needs is missing.
pub fn navigation_target(reminder: &Reminder, action: SuggestedAction) -> Option<NavigationTarget> {
    match action {
        SuggestedAction::FollowUp | SuggestedAction::ContactCustomer => reminder
            .customer_id
            .map(NavigationTarget::Customer)
            .or_else(|| reminder.lead_id.map(NavigationTarget::Lead)),
        SuggestedAction::ResendQuote | SuggestedAction::ReviewQuote => {
            reminder.quote_id.map(NavigationTarget::Quote)
        }
        SuggestedAction::MarkLost => reminder.lead_id.map(NavigationTarget::Lead),
    }
}

/// Target of the reminder's own suggested action. Views use `is_some()` to
/// decide whether to offer the action button as a link.
pub fn action_target(reminder: &Reminder) -> Option<NavigationTarget> {
    navigation_target(reminder, reminder.suggested_action)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub reminder_id: ReminderId,
    pub action: SuggestedAction,
    pub target: Option<NavigationTarget>,
}

#[cfg(test)]
#[path = "tests/dispatch_tests.rs"]
mod tests;
