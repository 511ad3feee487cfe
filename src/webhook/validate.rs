//! Payload validation
//!
//! Required fields are checked in a fixed order and the first missing one
//! is reported. "Missing" follows JavaScript truthiness: absent, `null`,
//! `false`, numeric zero and the empty string all count as missing. No
//! other type checking is applied.

use serde_json::{Map, Value};

use super::date::parse_created_at;
use super::error::WebhookError;
use super::types::WebhookRequest;

/// Required payload keys, in the order they are checked
pub const REQUIRED_FIELDS: [&str; 5] = [
    "text",
    "userName",
    "linkToTweet",
    "createdAt",
    "tweetEmbedCode",
];

/// Parse a raw body into a validated request
pub fn parse_payload(raw_body: &str) -> Result<WebhookRequest, WebhookError> {
    let value: Value = serde_json::from_str(raw_body).map_err(WebhookError::malformed)?;
    match value {
        Value::Object(fields) => validate(&fields),
        other => Err(WebhookError::malformed(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Validate an already-parsed JSON object
pub fn validate(fields: &Map<String, Value>) -> Result<WebhookRequest, WebhookError> {
    if let Some(missing) = REQUIRED_FIELDS
        .iter()
        .find(|name| !fields.get(**name).is_some_and(is_truthy))
    {
        return Err(WebhookError::MissingField(*missing));
    }

    let created_at =
        parse_created_at(&fields["createdAt"]).ok_or(WebhookError::InvalidDate)?;

    Ok(WebhookRequest {
        text: field_text(&fields["text"]),
        user_name: field_text(&fields["userName"]),
        link_to_tweet: field_text(&fields["linkToTweet"]),
        created_at,
        tweet_embed_code: field_text(&fields["tweetEmbedCode"]),
    })
}

/// JavaScript truthiness over JSON values
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
