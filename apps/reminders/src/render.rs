use client_core::action_target;
use shared::{
    domain::ReminderStatus,
    protocol::{CurrentUser, Reminder, StaleSummary},
};

pub fn reminder_table(reminders: &[Reminder], pending: &[bool]) -> String {
    if reminders.is_empty() {
        return "No open reminders.\n".to_string();
    }

    let mut out = format!(
        "{:<6} {:<7} {:>5}  {:<22} {:<17} {}\n",
        "ID", "PRIO", "STALE", "TYPE", "ACTION", "SUBJECT"
    );
    for (index, reminder) in reminders.iter().enumerate() {
        let mut action = reminder.suggested_action.label().to_string();
        if pending.get(index).copied().unwrap_or(false) {
            action.push_str(" …");
        } else if action_target(reminder).is_none() {
            // Nothing to open; the action can still be recorded.
            action.push_str(" *");
        }
        let status = match reminder.status() {
            ReminderStatus::Open => "",
            ReminderStatus::Acted => " (handled)",
            ReminderStatus::Dismissed => " (dismissed)",
        };
        out.push_str(&format!(
            "{:<6} {:<7} {:>4}d  {:<22} {:<17} {}{}\n",
            reminder.id,
            reminder.priority,
            reminder.days_stale,
            reminder.reminder_type,
            action,
            reminder.subject(),
            status
        ));
    }
    out
}

pub fn summary_line(summary: &StaleSummary) -> String {
    format!(
        "{} reminders ({} urgent) - {} stale leads, {} stale quotes",
        summary.total_reminders, summary.urgent_count, summary.stale_leads, summary.stale_quotes
    )
}

pub fn user_line(user: &CurrentUser) -> String {
    match &user.email {
        Some(email) => format!("{} <{}> [{:?}]", user.username, email, user.role),
        None => format!("{} [{:?}]", user.username, user.role),
    }
}
