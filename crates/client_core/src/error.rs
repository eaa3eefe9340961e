use shared::{domain::ReminderId, error::ErrorCode};
use thiserror::Error;

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unauthorized: session expired or token rejected")]
    Unauthorized,
    #[error("not logged in")]
    NotLoggedIn,
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend rejected request with status {status}")]
    Rejected {
        status: u16,
        code: ErrorCode,
        detail: Option<String>,
    },
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("reminder {0} already has an action in flight")]
    InFlight(ReminderId),
    #[error("reminder {0} is not in the current list")]
    UnknownReminder(ReminderId),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("token store failure: {0}")]
    TokenStore(#[from] std::io::Error),
}

impl ClientError {
    pub fn requires_login(&self) -> bool {
        matches!(self, ClientError::Unauthorized | ClientError::NotLoggedIn)
    }

    /// Text for the transient notification shown to the user. Backend
    /// detail wins when the backend sent one.
    pub fn notification_text(&self) -> String {
        match self {
            ClientError::Unauthorized | ClientError::NotLoggedIn => {
                "Your session has ended. Please sign in again.".to_string()
            }
            ClientError::Transport(err) if err.is_timeout() => {
                "The server took too long to respond. Please try again.".to_string()
            }
            ClientError::Transport(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            ClientError::Rejected {
                detail: Some(detail),
                ..
            } => detail.clone(),
            ClientError::Rejected { code, .. } => generic_rejection(*code).to_string(),
            ClientError::Decode(_) => "The server sent an unexpected response.".to_string(),
            ClientError::InFlight(_) => "That reminder is still being updated.".to_string(),
            ClientError::UnknownReminder(_) => {
                "That reminder is no longer in the list. Refresh and try again.".to_string()
            }
            ClientError::Config(message) => format!("Configuration error: {message}"),
            ClientError::TokenStore(_) => "Could not access the saved sign-in token.".to_string(),
        }
    }
}

fn generic_rejection(code: ErrorCode) -> &'static str {
    match code {
        ErrorCode::Unauthorized => "Your session has ended. Please sign in again.",
        ErrorCode::Forbidden => "You do not have permission to do that.",
        ErrorCode::NotFound => "That record no longer exists.",
        ErrorCode::Validation | ErrorCode::Conflict => "The request could not be completed.",
        ErrorCode::RateLimited => "Too many requests. Please wait a moment and try again.",
        ErrorCode::Internal => "Something went wrong. Please try again.",
    }
}
