//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: health probes, the webhook
//! endpoint, and access logging around both.

use crate::config::AppState;
use crate::http::{self, JsonResponseBuilder};
use crate::logger::{self, AccessLogEntry};
use crate::webhook::{self, WebhookError};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let started = Instant::now();
    let entry = state
        .config
        .logging
        .access_log
        .then(|| access_entry(&req, peer_addr));

    let response = route_request(req, &state).await;

    if let Some(mut entry) = entry {
        entry.status = response.status().as_u16();
        entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Route request based on method and path
async fn route_request<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let cfg = &state.config;
    let server_name = cfg.http.server_name.as_str();
    let method = req.method().clone();
    let path = req.uri().path();

    logger::log_headers_count(req.headers().len());

    // 1. Health check endpoints
    let health = &cfg.routes.health;
    if health.enabled
        && (path == health.liveness_path || path == health.readiness_path)
        && matches!(method, Method::GET | Method::HEAD)
    {
        return http::build_health_response(server_name, method == Method::HEAD);
    }

    // 2. Webhook endpoint
    if path != cfg.routes.webhook_path {
        return http::build_404_response(server_name);
    }

    match method {
        Method::POST => receive_webhook(req, state).await,
        Method::OPTIONS => http::build_options_response(server_name, cfg.http.enable_cors),
        _ => {
            logger::log_warning(&format!("Method not allowed on webhook path: {method}"));
            http::build_405_response(server_name)
        }
    }
}

/// Read the body under the size limit and hand it to the webhook handler
async fn receive_webhook<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let server_name = state.config.http.server_name.as_str();
    let max_body_size = state.config.http.max_body_size;

    if let Some(resp) = check_body_size(&req, max_body_size, server_name) {
        return resp;
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    match Limited::new(req.into_body(), limit).collect().await {
        Ok(collected) => {
            webhook::respond(JsonResponseBuilder::new(server_name), &collected.to_bytes())
        }
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            logger::log_error(&format!(
                "Request body too large (max: {max_body_size} bytes)"
            ));
            http::build_413_response(server_name)
        }
        Err(e) => webhook::respond_error(
            JsonResponseBuilder::new(server_name),
            &WebhookError::malformed(format!("failed to read request body: {e}")),
        ),
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(
    req: &Request<B>,
    max_body_size: u64,
    server_name: &str,
) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response(server_name))
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', relying on body limit"
                ));
                None
            }
            _ => None,
        },
    )
}

fn access_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let uri = req
        .uri()
        .path_and_query()
        .map_or_else(|| req.uri().path().to_string(), ToString::to_string);
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(peer_addr.ip().to_string(), req.method().to_string(), uri);
    entry.http_version = version_label(req.version()).to_string();
    entry.referer = header("referer");
    entry.user_agent = header("user-agent");
    entry
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use hyper::StatusCode;
    use serde_json::{json, Value};

    fn test_state(configure: impl FnOnce(&mut Config)) -> Arc<AppState> {
        let mut cfg = Config::load_from("does-not-exist/config").unwrap();
        cfg.logging.access_log = false;
        configure(&mut cfg);
        Arc::new(AppState::new(&cfg))
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    async fn send(
        state: &Arc<AppState>,
        method: Method,
        uri: &str,
        body: &str,
    ) -> (StatusCode, Response<Full<Bytes>>) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap();
        let resp = handle_request(req, Arc::clone(state), peer()).await.unwrap();
        (resp.status(), resp)
    }

    async fn json_body(resp: Response<Full<Bytes>>) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn valid_payload() -> Value {
        json!({
            "text": "Test tweet text",
            "userName": "testUser",
            "linkToTweet": "https://twitter.com/test/status/123",
            "createdAt": "2025-02-10T09:20:29Z",
            "tweetEmbedCode": "<blockquote>Test embed code</blockquote>"
        })
    }

    #[tokio::test]
    async fn test_valid_webhook() {
        let state = test_state(|_| {});
        let (status, resp) =
            send(&state, Method::POST, "/webhook", &valid_payload().to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp.headers()["Content-Type"], "application/json");
        assert_eq!(json_body(resp).await, json!({"success": true}));
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let state = test_state(|_| {});
        let (status, resp) = send(&state, Method::POST, "/webhook", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await, json!({"error": "text is required"}));
    }

    #[tokio::test]
    async fn test_invalid_date() {
        let state = test_state(|_| {});
        let mut payload = valid_payload();
        payload["createdAt"] = json!("invalid-date");
        let (status, resp) = send(&state, Method::POST, "/webhook", &payload.to_string()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(resp).await,
            json!({"error": "createdAt must be a valid date"})
        );
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let state = test_state(|_| {});
        let (status, resp) = send(&state, Method::POST, "/webhook", "not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await, json!({"error": "Invalid request format"}));
    }

    #[tokio::test]
    async fn test_custom_webhook_path() {
        let state = test_state(|cfg| cfg.routes.webhook_path = "/hooks/liked".to_string());
        let (status, _) =
            send(&state, Method::POST, "/hooks/liked", &valid_payload().to_string()).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) =
            send(&state, Method::POST, "/webhook", &valid_payload().to_string()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_wrong_method_on_webhook_path() {
        let state = test_state(|_| {});
        let (status, resp) = send(&state, Method::GET, "/webhook", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()["Allow"], "POST, OPTIONS");
    }

    #[tokio::test]
    async fn test_options_on_webhook_path() {
        let state = test_state(|cfg| cfg.http.enable_cors = true);
        let (status, resp) = send(&state, Method::OPTIONS, "/webhook", "").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(resp.headers()["Access-Control-Allow-Origin"], "*");
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let state = test_state(|_| {});
        let (status, resp) = send(&state, Method::GET, "/nope", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(resp).await, json!({"error": "Not Found"}));
    }

    #[tokio::test]
    async fn test_health_probes() {
        let state = test_state(|_| {});
        for path in ["/healthz", "/readyz"] {
            let (status, resp) = send(&state, Method::GET, path, "").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json_body(resp).await, json!({"status": "ok"}));
        }

        let state = test_state(|cfg| cfg.routes.health.enabled = false);
        let (status, _) = send(&state, Method::GET, "/healthz", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_body_over_limit() {
        let state = test_state(|cfg| cfg.http.max_body_size = 16);
        let (status, _) =
            send(&state, Method::POST, "/webhook", &valid_payload().to_string()).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_declared_content_length_over_limit() {
        let state = test_state(|cfg| cfg.http.max_body_size = 16);
        let req = Request::builder()
            .method(Method::POST)
            .uri("/webhook")
            .header("content-length", "4096")
            .body(Full::new(Bytes::from_static(b"{}")))
            .unwrap();
        let resp = handle_request(req, state, peer()).await.unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_access_log_enabled_does_not_change_response() {
        let state = test_state(|cfg| {
            cfg.logging.access_log = true;
            cfg.logging.access_log_format = "json".to_string();
        });
        let (status, resp) = send(&state, Method::POST, "/webhook?src=test", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await, json!({"error": "text is required"}));
    }

    #[test]
    fn test_access_entry_fields() {
        let req = Request::builder()
            .method(Method::POST)
            .uri("/webhook?src=test")
            .header("user-agent", "curl/8.0")
            .body(())
            .unwrap();
        let entry = access_entry(&req, peer());
        assert_eq!(entry.remote_addr, "127.0.0.1");
        assert_eq!(entry.method, "POST");
        assert_eq!(entry.uri, "/webhook?src=test");
        assert_eq!(entry.http_version, "1.1");
        assert_eq!(entry.user_agent.as_deref(), Some("curl/8.0"));
        assert!(entry.referer.is_none());
    }
}
