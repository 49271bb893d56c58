//! Configuration schema definitions.

use std::time::Duration;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};

use crate::observability::Level;

/// Environments the service knows how to run in.
pub const ENVIRONMENTS: [&str; 3] = ["development", "staging", "production"];

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// TCP port to listen on (all interfaces).
    pub port: u16,

    /// Deployment environment (development|staging|production).
    pub env: String,

    /// Largest accepted request body.
    pub max_body_bytes: usize,

    pub request_timeout_secs: u64,

    /// How long shutdown waits for background tasks.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 4000,
            env: "development".to_string(),
            max_body_bytes: 1_048_576,
            request_timeout_secs: 30,
            shutdown_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub min_level: Level,

    /// Fixed offset from UTC used for record timestamps.
    pub utc_offset_hours: i32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            min_level: Level::Info,
            utc_offset_hours: -8,
        }
    }
}

impl LoggingConfig {
    /// `None` when the offset is out of range.
    pub fn offset(&self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_hours.checked_mul(3600)?)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Serve Prometheus metrics on `metrics_address`.
    pub metrics_enabled: bool,
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9000".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            port = 8080

            [logging]
            min_level = "info_error"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.env, "development");
        assert_eq!(config.server.max_body_bytes, 1_048_576);
        assert_eq!(config.logging.min_level, Level::InfoError);
        assert_eq!(config.logging.utc_offset_hours, -8);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_offset() {
        let logging = LoggingConfig::default();
        assert_eq!(logging.offset().unwrap().local_minus_utc(), -8 * 3600);

        let bad = LoggingConfig {
            utc_offset_hours: 30,
            ..LoggingConfig::default()
        };
        assert!(bad.offset().is_none());
    }
}
