//! Startup orchestration.
//!
//! # Responsibilities
//! - Merge the config file with environment and flag overrides
//! - Build the process-wide logger from the logging config
//! - Install the tracing bridge, the panic hook and the optional metrics exporter
//!
//! # Design Decisions
//! - Fail fast on configuration errors; observability failures only log
//! - Listeners start last (traffic only when ready)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{finalize, load_config, AppConfig, ConfigError, LoggingConfig};
use crate::observability::logging::{properties, Logger};
use crate::observability::{metrics, panics, tracing};

/// Settings that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub env: Option<String>,
}

/// Defaults, then the optional file, then `overrides`; validated last so the
/// overrides are checked too.
pub fn resolve_config(overrides: Overrides) -> Result<AppConfig, ConfigError> {
    let mut config = match &overrides.config_path {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    if let Some(port) = overrides.port {
        config.server.port = port;
    }
    if let Some(env) = overrides.env {
        config.server.env = env;
    }

    finalize(config)
}

/// Logger on stdout with the configured level and timestamp offset.
pub fn build_logger(config: &LoggingConfig) -> Arc<Logger> {
    let logger = Logger::stdout(config.min_level);
    let logger = match config.offset() {
        Some(offset) => logger.with_offset(offset),
        None => logger,
    };
    Arc::new(logger)
}

/// Route `tracing` events into `logger`, take over the panic hook, and start
/// the metrics exporter when enabled.
///
/// Must be called from within a Tokio runtime.
pub fn init_observability(config: &AppConfig, logger: &Arc<Logger>, version: &str) {
    panics::install_hook();
    if let Err(e) = tracing::init(logger.sink()) {
        logger.error(&format!("tracing subscriber not installed: {e}"));
    }

    if config.observability.metrics_enabled {
        let address = &config.observability.metrics_address;
        match address.parse::<SocketAddr>() {
            Ok(addr) => match metrics::init_metrics(addr) {
                Ok(()) => logger.info_with(
                    "metrics exporter listening",
                    &properties([("addr", addr.to_string())]),
                ),
                Err(e) => logger.error(&format!("metrics exporter not started: {e}")),
            },
            Err(e) => logger.error(&format!("invalid metrics address {address:?}: {e}")),
        }
    }
    metrics::record_build_info(version);
}
