// Webhook payload and acknowledgement types

use chrono::NaiveDateTime;
use serde::Serialize;

/// A liked-post event that passed validation.
///
/// Field values are taken verbatim; non-string JSON values that still count
/// as present are kept as their JSON text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookRequest {
    pub text: String,
    pub user_name: String,
    pub link_to_tweet: String,
    /// Parsed `createdAt`, in UTC when the sender supplied an offset
    pub created_at: NaiveDateTime,
    pub tweet_embed_code: String,
}

/// JSON body returned for every webhook call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WebhookResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WebhookResponse {
    pub const fn accepted() -> Self {
        Self {
            success: Some(true),
            error: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_serializes_without_error_key() {
        let json = serde_json::to_string(&WebhookResponse::accepted()).unwrap();
        assert_eq!(json, r#"{"success":true}"#);
    }

    #[test]
    fn test_rejected_serializes_without_success_key() {
        let json = serde_json::to_string(&WebhookResponse::rejected("text is required")).unwrap();
        assert_eq!(json, r#"{"error":"text is required"}"#);
    }
}
