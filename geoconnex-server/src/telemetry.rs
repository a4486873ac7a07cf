//! Logging setup
//!
//! Filter precedence: `RUST_LOG`, then `LOG_LEVEL`, then `--log-level`.
//! `LOG_FORMAT=json` switches to JSON lines.

use crate::config::ServerConfig;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Telemetry configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Primary log filter (RUST_LOG env var)
    pub log_filter: String,
    /// Fallback log level if RUST_LOG not set
    pub default_level: String,
    /// Log format ("human" or "json")
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Human,
    Json,
}

impl LogFormat {
    fn from_env_value(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Human,
        }
    }
}

impl TelemetryConfig {
    /// Create telemetry config with server config for CLI log level support
    pub fn with_server_config(server_config: &ServerConfig) -> Self {
        Self::from_env_with_defaults(server_config.log_level.clone())
    }

    fn from_env_with_defaults(cli_level: String) -> Self {
        let log_filter = env::var("RUST_LOG").unwrap_or_default();
        let default_level = env::var("LOG_LEVEL")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or(cli_level);
        Self {
            log_filter,
            default_level,
            log_format: LogFormat::from_env_value(&env::var("LOG_FORMAT").unwrap_or_default()),
        }
    }

    fn filter(&self) -> EnvFilter {
        if self.log_filter.is_empty() {
            EnvFilter::new(&self.default_level)
        } else {
            EnvFilter::new(&self.log_filter)
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self::from_env_with_defaults("info".to_string())
    }
}

/// Initialize logging
///
/// Safe to call multiple times - will only initialize once.
pub fn init_logging(config: &TelemetryConfig) {
    // Check if a global subscriber is already set (e.g., from tests)
    if tracing::dispatcher::has_been_set() {
        tracing::debug!("tracing subscriber already initialized, skipping");
        return;
    }

    let fmt_layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(false)
            .boxed(),
        LogFormat::Human => tracing_subscriber::fmt::layer().compact().boxed(),
    };

    // try_init: another thread may have set the subscriber since the check above
    let _ = tracing_subscriber::registry()
        .with(config.filter())
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::from_env_value("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::from_env_value("human"), LogFormat::Human);
        assert_eq!(LogFormat::from_env_value(""), LogFormat::Human);
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = TelemetryConfig {
            log_filter: String::new(),
            default_level: "warn".to_string(),
            log_format: LogFormat::Human,
        };
        init_logging(&config);
        init_logging(&config);
    }
}
