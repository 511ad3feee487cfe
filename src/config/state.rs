// Application state module
// Shared, read-only configuration plus connection bookkeeping

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use super::types::Config;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Connections currently being served
    pub active_connections: AtomicUsize,
    /// Notified once when SIGTERM/SIGINT arrives
    pub shutdown: Arc<Notify>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
            active_connections: AtomicUsize::new(0),
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }
}
