//! HTTP response building module
//!
//! Every response is JSON and carries the configured `Server` header.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};

use crate::webhook::ResponseBuilder;

/// Methods accepted on the webhook path
pub const WEBHOOK_ALLOW: &str = "POST, OPTIONS";

/// [`ResponseBuilder`] producing hyper responses
pub struct JsonResponseBuilder<'a> {
    status: StatusCode,
    server_name: &'a str,
}

impl<'a> JsonResponseBuilder<'a> {
    pub const fn new(server_name: &'a str) -> Self {
        Self {
            status: StatusCode::OK,
            server_name,
        }
    }
}

impl ResponseBuilder for JsonResponseBuilder<'_> {
    type Response = Response<Full<Bytes>>;

    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn set_body(self, json: String) -> Self::Response {
        build_json(self.status, self.server_name, json, &[])
    }
}

/// Build 200 health probe response
pub fn build_health_response(server_name: &str, is_head: bool) -> Response<Full<Bytes>> {
    let body = if is_head {
        String::new()
    } else {
        r#"{"status":"ok"}"#.to_string()
    };
    build_json(StatusCode::OK, server_name, body, &[])
}

/// Build 404 Not Found response
pub fn build_404_response(server_name: &str) -> Response<Full<Bytes>> {
    build_json(
        StatusCode::NOT_FOUND,
        server_name,
        r#"{"error":"Not Found"}"#.to_string(),
        &[],
    )
}

/// Build 405 Method Not Allowed response for the webhook path
pub fn build_405_response(server_name: &str) -> Response<Full<Bytes>> {
    build_json(
        StatusCode::METHOD_NOT_ALLOWED,
        server_name,
        r#"{"error":"Method Not Allowed"}"#.to_string(),
        &[("Allow", WEBHOOK_ALLOW)],
    )
}

/// Build 413 Payload Too Large response
pub fn build_413_response(server_name: &str) -> Response<Full<Bytes>> {
    build_json(
        StatusCode::PAYLOAD_TOO_LARGE,
        server_name,
        r#"{"error":"Payload Too Large"}"#.to_string(),
        &[],
    )
}

/// Build OPTIONS response (preflight request)
pub fn build_options_response(server_name: &str, enable_cors: bool) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Server", server_name)
        .header("Allow", WEBHOOK_ALLOW);

    if enable_cors {
        builder = builder
            .header("Access-Control-Allow-Origin", "*")
            .header("Access-Control-Allow-Methods", WEBHOOK_ALLOW)
            .header("Access-Control-Allow-Headers", "Content-Type")
            .header("Access-Control-Max-Age", "86400");
    }

    builder.body(Full::new(Bytes::new())).unwrap_or_else(|e| {
        log_build_error(StatusCode::NO_CONTENT, &e);
        Response::new(Full::new(Bytes::new()))
    })
}

fn build_json(
    status: StatusCode,
    server_name: &str,
    body: String,
    extra_headers: &[(&str, &str)],
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Server", server_name);
    for (name, value) in extra_headers {
        builder = builder.header(*name, *value);
    }

    builder.body(Full::new(Bytes::from(body))).unwrap_or_else(|e| {
        log_build_error(status, &e);
        let mut fallback = Response::new(Full::new(Bytes::new()));
        *fallback.status_mut() = status;
        fallback
    })
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
