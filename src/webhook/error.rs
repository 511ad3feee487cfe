//! Webhook error taxonomy
//!
//! Every variant surfaces to the client as `400 Bad Request` with the
//! `Display` text as the JSON `error` string.

use hyper::StatusCode;
use thiserror::Error;

/// Message shared by every malformed-payload rejection
pub const INVALID_REQUEST_FORMAT: &str = "Invalid request format";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Body could not be read, decoded or parsed into a JSON object.
    /// `cause` is for the logs only and never reaches the client.
    #[error("Invalid request format")]
    MalformedPayload { cause: String },

    /// First required field that is absent or falsy
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("createdAt must be a valid date")]
    InvalidDate,
}

impl WebhookError {
    /// Status every rejection is answered with
    pub const STATUS: StatusCode = StatusCode::BAD_REQUEST;

    pub fn malformed(cause: impl std::fmt::Display) -> Self {
        Self::MalformedPayload {
            cause: cause.to_string(),
        }
    }
}
