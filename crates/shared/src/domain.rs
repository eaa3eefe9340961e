use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<i64>().map($name)
            }
        }
    };
}

id_newtype!(ReminderId);
id_newtype!(LeadId);
id_newtype!(QuoteId);
id_newtype!(CustomerId);
id_newtype!(UserId);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

/// Closed enums whose wire names double as CLI vocabulary.
macro_rules! wire_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $wire:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
                match normalized.as_str() {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                        expected: [$($wire),+].join(", "),
                    }),
                }
            }
        }
    };
}

wire_enum!(ReminderPriority, "priority", {
    Urgent => "URGENT",
    High => "HIGH",
    Medium => "MEDIUM",
    Low => "LOW",
});

impl ReminderPriority {
    /// Urgency tier, 0 being the most urgent.
    pub fn tier(self) -> u8 {
        match self {
            ReminderPriority::Urgent => 0,
            ReminderPriority::High => 1,
            ReminderPriority::Medium => 2,
            ReminderPriority::Low => 3,
        }
    }
}

wire_enum!(ReminderType, "reminder type", {
    LeadStale => "LEAD_STALE",
    QuoteStale => "QUOTE_STALE",
    QuoteExpired => "QUOTE_EXPIRED",
    QuoteExpiring => "QUOTE_EXPIRING",
    QuoteNotOpened => "QUOTE_NOT_OPENED",
    QuoteOpenedNoReply => "QUOTE_OPENED_NO_REPLY",
});

wire_enum!(SuggestedAction, "action", {
    FollowUp => "FOLLOW_UP",
    ContactCustomer => "CONTACT_CUSTOMER",
    ResendQuote => "RESEND_QUOTE",
    ReviewQuote => "REVIEW_QUOTE",
    MarkLost => "MARK_LOST",
});

impl SuggestedAction {
    pub fn label(self) -> &'static str {
        match self {
            SuggestedAction::FollowUp => "Follow up",
            SuggestedAction::ContactCustomer => "Contact customer",
            SuggestedAction::ResendQuote => "Resend quote",
            SuggestedAction::ReviewQuote => "Review quote",
            SuggestedAction::MarkLost => "Mark lost",
        }
    }
}

/// Client view of a reminder's lifecycle. Dismissed and Acted are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Open,
    Dismissed,
    Acted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Manager,
    Sales,
    #[serde(other)]
    Other,
}
