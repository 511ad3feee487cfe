// Signal handling module
//
// - SIGTERM: graceful shutdown
// - SIGINT:  graceful shutdown (Ctrl+C)

use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Spawn a task that notifies `shutdown` on SIGTERM or SIGINT (Unix)
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<Notify>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        logger::log_info(&format!("[Signal] {name} received, shutting down gracefully"));
        // Stores a permit, so the server loop sees it even if it is mid-accept
        shutdown.notify_one();
    });

    logger::log_info(&format!(
        "[Signal] Handlers registered (pid {}): SIGTERM, SIGINT",
        std::process::id()
    ));
    Ok(())
}

/// Non-Unix fallback: only Ctrl+C is supported
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<Notify>) -> std::io::Result<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            logger::log_info("[Signal] Ctrl+C received, shutting down gracefully");
            shutdown.notify_one();
        }
    });
    Ok(())
}
