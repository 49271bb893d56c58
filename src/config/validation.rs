//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure function: `&AppConfig → Result<(), Validator>`

use std::net::SocketAddr;

use crate::config::schema::{AppConfig, ENVIRONMENTS};
use crate::validator::{permitted_value, Validator};

pub fn validate_config(config: &AppConfig) -> Result<(), Validator> {
    let mut v = Validator::new();
    let server = &config.server;

    v.check(server.port != 0, "server.port", "must not be zero");
    v.check(
        permitted_value(&server.env.as_str(), &ENVIRONMENTS),
        "server.env",
        "must be one of development, staging, production",
    );
    v.check(server.max_body_bytes > 0, "server.max_body_bytes", "must be greater than zero");
    v.check(
        server.request_timeout_secs > 0,
        "server.request_timeout_secs",
        "must be greater than zero",
    );
    v.check(
        server.shutdown_timeout_secs > 0,
        "server.shutdown_timeout_secs",
        "must be greater than zero",
    );
    v.check(
        config.logging.offset().is_some(),
        "logging.utc_offset_hours",
        "must be between -23 and 23",
    );
    if config.observability.metrics_enabled {
        v.check(
            config.observability.metrics_address.parse::<SocketAddr>().is_ok(),
            "observability.metrics_address",
            "must be a socket address",
        );
    }

    if v.valid() {
        Ok(())
    } else {
        Err(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_reports_every_problem() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        config.server.env = "qa".into();
        config.logging.utc_offset_hours = 24;
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "nowhere".into();

        let v = validate_config(&config).unwrap_err();
        assert_eq!(v.errors().len(), 4);
        assert_eq!(v.get("server.port"), Some("must not be zero"));
        assert!(v.get("server.env").is_some());
        assert!(v.get("logging.utc_offset_hours").is_some());
        assert!(v.get("observability.metrics_address").is_some());
    }
}
