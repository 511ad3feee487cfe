//! Access log format module
//!
//! - `combined`: Apache/Nginx combined format
//! - `common`: Common Log Format (CLF)
//! - `json`: one JSON object per line

use chrono::{DateTime, Local};
use serde::Serialize;

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// One served request
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    pub time: DateTime<Local>,
    pub method: String,
    /// Request path including the query string, if any
    pub uri: String,
    /// HTTP version without the `HTTP/` prefix (1.0, 1.1, 2)
    pub http_version: String,
    pub status: u16,
    pub body_bytes: u64,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub request_time_us: u64,
}

/// Borrowed view used for the `json` format
#[derive(Serialize)]
struct JsonLine<'a> {
    remote_addr: &'a str,
    time: String,
    method: &'a str,
    uri: &'a str,
    http_version: &'a str,
    status: u16,
    body_bytes: u64,
    referer: Option<&'a str>,
    user_agent: Option<&'a str>,
    request_time_us: u64,
}

impl AccessLogEntry {
    /// Start an entry stamped with the current local time
    pub fn new(remote_addr: String, method: String, uri: String) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method,
            uri,
            http_version: "1.1".to_string(),
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            request_time_us: 0,
        }
    }

    pub fn format(&self, format: &str) -> String {
        match format {
            "json" => self.format_json(),
            "common" => self.request_prefix(),
            _ => format!(
                "{} \"{}\" \"{}\"",
                self.request_prefix(),
                self.referer.as_deref().unwrap_or("-"),
                self.user_agent.as_deref().unwrap_or("-"),
            ),
        }
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn request_prefix(&self) -> String {
        format!(
            "{} - - [{}] \"{} {} HTTP/{}\" {} {}",
            self.remote_addr,
            self.time.format(CLF_TIME),
            self.method,
            self.uri,
            self.http_version,
            self.status,
            self.body_bytes,
        )
    }

    fn format_json(&self) -> String {
        let line = JsonLine {
            remote_addr: &self.remote_addr,
            time: self.time.to_rfc3339(),
            method: &self.method,
            uri: &self.uri,
            http_version: &self.http_version,
            status: self.status,
            body_bytes: self.body_bytes,
            referer: self.referer.as_deref(),
            user_agent: self.user_agent.as_deref(),
            request_time_us: self.request_time_us,
        };
        serde_json::to_string(&line).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    }
}
