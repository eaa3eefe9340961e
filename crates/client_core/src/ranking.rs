use std::cmp::{Ordering, Reverse};

use shared::protocol::Reminder;

/// Priority tier first (URGENT before LOW), then the stalest first.
pub fn compare(a: &Reminder, b: &Reminder) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

fn sort_key(reminder: &Reminder) -> (u8, Reverse<u32>) {
    (reminder.priority.tier(), Reverse(reminder.days_stale))
}

/// Stable: reminders with equal keys keep their fetched order.
pub fn rank(reminders: &mut [Reminder]) {
    reminders.sort_by(compare);
}

pub fn ranked(mut reminders: Vec<Reminder>) -> Vec<Reminder> {
    rank(&mut reminders);
    reminders
}

#[cfg(test)]
#[path = "tests/ranking_tests.rs"]
mod tests;
