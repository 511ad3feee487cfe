//! Webhook request handler
//!
//! `handle` turns a raw body into a status code and acknowledgement. It never
//! fails: every error becomes a `400` with a JSON `error` message. Output
//! construction goes through [`ResponseBuilder`] so the handler does not
//! depend on any particular HTTP stack.

use hyper::StatusCode;

use super::error::{WebhookError, INVALID_REQUEST_FORMAT};
use super::types::WebhookResponse;
use super::validate::parse_payload;
use crate::logger;

/// Host capability for emitting a JSON response
pub trait ResponseBuilder {
    type Response;

    fn set_status(&mut self, status: StatusCode);

    /// Attach the serialized JSON body and finish the response
    fn set_body(self, json: String) -> Self::Response;
}

/// Validate a raw webhook body
pub fn handle(raw_body: &str) -> (StatusCode, WebhookResponse) {
    logger::log_webhook_received(raw_body);

    match parse_payload(raw_body) {
        Ok(request) => {
            logger::log_webhook_accepted(&request);
            (StatusCode::OK, WebhookResponse::accepted())
        }
        Err(err) => reject(&err),
    }
}

/// Validate a body that has not been decoded yet
pub fn handle_bytes(body: &[u8]) -> (StatusCode, WebhookResponse) {
    match std::str::from_utf8(body) {
        Ok(text) => handle(text),
        Err(e) => reject(&WebhookError::malformed(format!(
            "request body is not valid UTF-8: {e}"
        ))),
    }
}

/// Run the handler and emit its result through `builder`
pub fn respond<B: ResponseBuilder>(builder: B, body: &[u8]) -> B::Response {
    let (status, response) = handle_bytes(body);
    emit(builder, status, &response)
}

/// Emit the response for a payload that never reached the validator
pub fn respond_error<B: ResponseBuilder>(builder: B, err: &WebhookError) -> B::Response {
    let (status, response) = reject(err);
    emit(builder, status, &response)
}

fn reject(err: &WebhookError) -> (StatusCode, WebhookResponse) {
    match err {
        WebhookError::MalformedPayload { cause } => logger::log_webhook_error(cause),
        _ => logger::log_webhook_rejected(err),
    }
    (WebhookError::STATUS, WebhookResponse::rejected(err.to_string()))
}

fn emit<B: ResponseBuilder>(
    mut builder: B,
    status: StatusCode,
    response: &WebhookResponse,
) -> B::Response {
    let (status, json) = match serde_json::to_string(response) {
        Ok(json) => (status, json),
        Err(e) => {
            logger::log_error(&format!("Failed to serialize webhook response: {e}"));
            (
                StatusCode::BAD_REQUEST,
                format!(r#"{{"error":"{INVALID_REQUEST_FORMAT}"}}"#),
            )
        }
    };
    builder.set_status(status);
    builder.set_body(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    /// Records what the handler asked for instead of building a real response
    #[derive(Default)]
    struct RecordingBuilder {
        status: Option<StatusCode>,
    }

    impl ResponseBuilder for RecordingBuilder {
        type Response = (Option<StatusCode>, Value);

        fn set_status(&mut self, status: StatusCode) {
            self.status = Some(status);
        }

        fn set_body(self, json: String) -> Self::Response {
            (self.status, serde_json::from_str(&json).unwrap())
        }
    }

    fn call(body: &str) -> (Option<StatusCode>, Value) {
        respond(RecordingBuilder::default(), body.as_bytes())
    }

    fn valid_body() -> Value {
        json!({
            "text": "t",
            "userName": "u",
            "linkToTweet": "l",
            "createdAt": "2025-02-10T09:20:29Z",
            "tweetEmbedCode": "<b></b>"
        })
    }

    #[test]
    fn test_empty_object() {
        let (status, body) = call("{}");
        assert_eq!(status, Some(StatusCode::BAD_REQUEST));
        assert_eq!(body, json!({"error": "text is required"}));
    }

    #[test]
    fn test_valid_request() {
        let (status, body) = call(&valid_body().to_string());
        assert_eq!(status, Some(StatusCode::OK));
        assert_eq!(body, json!({"success": true}));
    }

    #[test]
    fn test_invalid_created_at() {
        let mut payload = valid_body();
        payload["createdAt"] = json!("invalid-date");
        let (status, body) = call(&payload.to_string());
        assert_eq!(status, Some(StatusCode::BAD_REQUEST));
        assert_eq!(body, json!({"error": "createdAt must be a valid date"}));
        assert!(body["error"].as_str().unwrap().contains("createdAt"));
    }

    #[test]
    fn test_malformed_json() {
        let (status, body) = call("{\"text\": ");
        assert_eq!(status, Some(StatusCode::BAD_REQUEST));
        assert_eq!(body, json!({"error": "Invalid request format"}));
    }

    #[test]
    fn test_every_missing_field_yields_non_empty_error() {
        for field in super::super::validate::REQUIRED_FIELDS {
            let mut payload = valid_body();
            payload.as_object_mut().unwrap().remove(field);
            let (status, body) = call(&payload.to_string());
            assert_eq!(status, Some(StatusCode::BAD_REQUEST));
            assert_eq!(body["error"], json!(format!("{field} is required")));
            assert!(body.get("success").is_none());
        }
    }

    #[test]
    fn test_non_utf8_body() {
        let (status, body) = respond(RecordingBuilder::default(), &[0x7b, 0xff, 0x7d]);
        assert_eq!(status, Some(StatusCode::BAD_REQUEST));
        assert_eq!(body, json!({"error": "Invalid request format"}));
    }

    #[test]
    fn test_respond_error() {
        let err = WebhookError::malformed("connection reset");
        let (status, body) = respond_error(RecordingBuilder::default(), &err);
        assert_eq!(status, Some(StatusCode::BAD_REQUEST));
        assert_eq!(body, json!({"error": "Invalid request format"}));
    }

    #[test]
    fn test_handle_returns_typed_response() {
        let (status, response) = handle(&valid_body().to_string());
        assert_eq!(status, StatusCode::OK);
        assert_eq!(response, WebhookResponse::accepted());
    }
}
