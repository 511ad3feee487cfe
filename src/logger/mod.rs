//! Logger module
//!
//! Server lifecycle, access and webhook event logging. Lines below the
//! configured level are dropped; before `init` everything at info and above
//! goes to stdout/stderr.

mod format;
mod level;
pub mod writer;

pub use format::AccessLogEntry;
pub use level::LogLevel;

use chrono::Local;
use std::net::SocketAddr;

use crate::config::Config;
use crate::webhook::{WebhookError, WebhookRequest};

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = config
        .logging
        .level
        .parse::<LogLevel>()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    writer::init(
        level,
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn enabled(level: LogLevel) -> bool {
    level <= writer::get().map_or(LogLevel::Info, writer::LogWriter::level)
}

fn stamp(level: LogLevel, message: &str) -> String {
    format!(
        "{} {:<5} {message}",
        Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
        level.as_str()
    )
}

/// Info and debug lines go to the access target
fn write_info(level: LogLevel, message: &str) {
    if !enabled(level) {
        return;
    }
    let line = stamp(level, message);
    match writer::get() {
        Some(w) => w.write_access(&line),
        None => println!("{line}"),
    }
}

/// Warnings and errors go to the error target
fn write_error(level: LogLevel, message: &str) {
    if !enabled(level) {
        return;
    }
    let line = stamp(level, message);
    match writer::get() {
        Some(w) => w.write_error(&line),
        None => eprintln!("{line}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    let info = |m: &str| write_info(LogLevel::Info, m);
    info("======================================");
    info("Liked-post webhook receiver started");
    info(&format!(
        "Listening on: http://{addr}{}",
        config.routes.webhook_path
    ));
    info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        info(&format!("Worker threads: {workers}"));
    }
    if let Some(max) = config.performance.max_connections {
        info(&format!("Max connections: {max}"));
    }
    info(&format!("Max body size: {} bytes", config.http.max_body_size));
    if let Some(ref path) = config.logging.access_log_file {
        info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        info(&format!("Error log: {path}"));
    }
    info("======================================");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(LogLevel::Debug, &format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(
        LogLevel::Error,
        &format!("[ERROR] Failed to serve connection: {err:?}"),
    );
}

pub fn log_error(message: &str) {
    write_error(LogLevel::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(LogLevel::Warn, &format!("[WARN] {message}"));
}

pub fn log_info(message: &str) {
    write_info(LogLevel::Info, message);
}

pub fn log_headers_count(count: usize) {
    write_info(LogLevel::Debug, &format!("[Headers] Count: {count}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    let line = entry.format(format);
    match writer::get() {
        Some(w) => w.write_access(&line),
        None => println!("{line}"),
    }
}

pub fn log_webhook_received(raw_body: &str) {
    write_info(
        LogLevel::Info,
        &format!("[Webhook] Received webhook request: {raw_body}"),
    );
}

pub fn log_webhook_accepted(request: &WebhookRequest) {
    write_info(
        LogLevel::Info,
        &format!(
            "[Webhook] Accepted post by {} created at {}: {} (text: {} chars, embed: {} bytes)",
            request.user_name,
            request.created_at.format("%Y-%m-%dT%H:%M:%S"),
            request.link_to_tweet,
            request.text.chars().count(),
            request.tweet_embed_code.len()
        ),
    );
}

pub fn log_webhook_rejected(err: &WebhookError) {
    write_error(LogLevel::Warn, &format!("[Webhook] Rejected: {err}"));
}

pub fn log_webhook_error(cause: &str) {
    write_error(
        LogLevel::Error,
        &format!("[Webhook] Error processing webhook request: {cause}"),
    );
}

pub fn log_shutdown_started(active: usize) {
    write_info(
        LogLevel::Info,
        &format!("[Shutdown] Stopped accepting connections, {active} still active"),
    );
}

pub fn log_shutdown_complete(remaining: usize) {
    if remaining == 0 {
        write_info(LogLevel::Info, "[Shutdown] All connections drained, exiting");
    } else {
        log_warning(&format!(
            "[Shutdown] Grace period elapsed with {remaining} connection(s) still open"
        ));
    }
}
