use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Conflict,
    RateLimited,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            400 | 422 => ErrorCode::Validation,
            409 => ErrorCode::Conflict,
            429 => ErrorCode::RateLimited,
            _ => ErrorCode::Internal,
        }
    }
}

/// Error envelope returned by the CRM backend. `detail` is either a plain
/// message or a list of field validation items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ApiErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(Value::String(detail.into())),
        }
    }

    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
            Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter_map(|item| match item {
                        Value::String(text) => Some(text.clone()),
                        Value::Object(fields) => fields
                            .get("msg")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                        _ => None,
                    })
                    .collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(parts.join("; "))
                }
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_detail_is_returned_verbatim() {
        let body: ApiErrorBody =
            serde_json::from_str(r#"{"detail":"Reminder already dismissed"}"#).unwrap();
        assert_eq!(body.message().as_deref(), Some("Reminder already dismissed"));
    }

    #[test]
    fn validation_items_are_joined() {
        let body: ApiErrorBody = serde_json::from_str(
            r#"{"detail":[{"loc":["body","action_taken"],"msg":"field required"},{"msg":"bad notes"}]}"#,
        )
        .unwrap();
        assert_eq!(body.message().as_deref(), Some("field required; bad notes"));
    }

    #[test]
    fn empty_or_missing_detail_yields_none() {
        assert!(ApiErrorBody::default().message().is_none());
        assert!(ApiErrorBody::new("  ").message().is_none());
    }

    #[test]
    fn maps_http_status_to_code() {
        assert_eq!(ErrorCode::from_status(422), ErrorCode::Validation);
        assert_eq!(ErrorCode::from_status(409), ErrorCode::Conflict);
        assert_eq!(ErrorCode::from_status(502), ErrorCode::Internal);
    }
}
