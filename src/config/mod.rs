// Configuration module entry point
// Layered settings (defaults, config file, environment) and runtime state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::Config;

/// Default config file name (resolved as config.toml)
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Access log formats understood by the logger
const ACCESS_LOG_FORMATS: [&str; 3] = ["combined", "common", "json"];

impl Config {
    /// Load configuration from specified file path (without extension)
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::load_layered(config_path, env_source(), std::env::var("PORT").ok())
    }

    /// Defaults, then the file, then `env`, then `port`
    fn load_layered(
        config_path: &str,
        env: config::Environment,
        port: Option<String>,
    ) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(env)
            // Container platforms hand the listening port over in $PORT
            .set_override_option("server.port", port)?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("performance.shutdown_timeout", 10)?
            .set_default("http.server_name", "liked-post-webhook/0.1")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 1_048_576)? // 1MB
            .set_default("routes.webhook_path", "/webhook")?
            .build()?;

        let cfg: Self = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from the path given as the first CLI argument, or `config`
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::args()
            .nth(1)
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if let Err(e) = self.logging.level.parse::<crate::logger::LogLevel>() {
            return Err(config::ConfigError::Message(e));
        }
        if !ACCESS_LOG_FORMATS.contains(&self.logging.access_log_format.as_str()) {
            return Err(config::ConfigError::Message(format!(
                "Unknown access log format '{}' (expected one of: {})",
                self.logging.access_log_format,
                ACCESS_LOG_FORMATS.join(", ")
            )));
        }
        if !self.routes.webhook_path.starts_with('/') {
            return Err(config::ConfigError::Message(format!(
                "Webhook path must start with '/': '{}'",
                self.routes.webhook_path
            )));
        }
        self.get_socket_addr().map_err(config::ConfigError::Message)?;
        Ok(())
    }
}

/// `WEBHOOK_` prefixed variables, nested with `__` (`WEBHOOK_SERVER__PORT`)
fn env_source() -> config::Environment {
    config::Environment::with_prefix("WEBHOOK")
        .prefix_separator("_")
        .separator("__")
}
