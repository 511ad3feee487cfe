// Server loop module
// Accepts connections until shutdown is requested, then drains

use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::shutdown::drain_connections;
use crate::config::AppState;
use crate::logger;

/// Accept connections until `state.shutdown` is notified.
///
/// Must run inside a `LocalSet`: connections are served with `spawn_local`.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = Arc::clone(&state.shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => accept_connection(stream, peer_addr, &state),
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = shutdown.notified() => break,
        }
    }

    // Stop accepting before waiting on in-flight requests
    drop(listener);
    logger::log_shutdown_started(state.active_connections());

    let grace = std::time::Duration::from_secs(state.config.performance.shutdown_timeout);
    let remaining = drain_connections(&state, grace).await;
    logger::log_shutdown_complete(remaining);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::server::create_reusable_listener;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_serves_webhook_and_shuts_down() {
        let mut cfg = Config::load_from("does-not-exist/config").unwrap();
        cfg.logging.access_log = false;
        cfg.performance.shutdown_timeout = 1;
        let state = Arc::new(AppState::new(&cfg));

        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async move {
                let server = tokio::task::spawn_local(start_server_loop(
                    listener,
                    Arc::clone(&state),
                ));

                let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
                let body = "{}";
                let request = format!(
                    "POST /webhook HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(request.as_bytes()).await.unwrap();

                let mut response = String::new();
                stream.read_to_string(&mut response).await.unwrap();
                assert!(response.starts_with("HTTP/1.1 400"));
                assert!(response.contains("content-type: application/json"));
                assert!(response.ends_with(r#"{"error":"text is required"}"#));

                state.shutdown.notify_one();
                let result = server.await.unwrap();
                assert!(result.is_ok());
            })
            .await;
    }
}
