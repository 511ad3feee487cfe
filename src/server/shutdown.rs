// Graceful shutdown module
// Waits for in-flight connections after the listener is closed

use std::time::Duration;

use crate::config::AppState;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Wait until no connections remain or `grace` elapses.
///
/// Returns the number of connections still open when it gave up. Open
/// connections are not aborted here; they end with the runtime.
pub async fn drain_connections(state: &AppState, grace: Duration) -> usize {
    let deadline = tokio::time::Instant::now() + grace;

    loop {
        let active = state.active_connections();
        if active == 0 || tokio::time::Instant::now() >= deadline {
            return active;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn state() -> Arc<AppState> {
        let cfg = Config::load_from("does-not-exist/config").unwrap();
        Arc::new(AppState::new(&cfg))
    }

    #[tokio::test]
    async fn test_returns_immediately_when_idle() {
        let state = state();
        assert_eq!(drain_connections(&state, Duration::from_secs(5)).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_grace_period() {
        let state = state();
        state.active_connections.store(2, Ordering::SeqCst);
        assert_eq!(drain_connections(&state, Duration::from_secs(1)).await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_connections_to_finish() {
        let state = state();
        state.active_connections.store(1, Ordering::SeqCst);

        let finisher = Arc::clone(&state);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(120)).await;
            finisher.active_connections.store(0, Ordering::SeqCst);
        });

        assert_eq!(drain_connections(&state, Duration::from_secs(5)).await, 0);
    }
}
