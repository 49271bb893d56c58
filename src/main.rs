//! Farm telemetry API server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ request log ──▶ panic guard ──▶ timeout ──▶ router ──▶ farm handlers
//!                          │               │                                    │
//!                          ▼               ▼                                    ▼
//!                     ┌─────────────────────────┐                    ┌────────────────────┐
//!                     │  Logger (JSON lines on  │◀───────────────────│  BackgroundTasks   │
//!                     │  stdout, one lock)      │                    │  (counted, drained │
//!                     └─────────────────────────┘                    │   at shutdown)     │
//!                                                                    └────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use tokio::net::TcpListener;

use farm_telemetry::config::LoggingConfig;
use farm_telemetry::farm::FarmSnapshot;
use farm_telemetry::lifecycle::signals::terminate_signal;
use farm_telemetry::lifecycle::startup::{build_logger, init_observability, resolve_config, Overrides};
use farm_telemetry::observability::logging::properties;
use farm_telemetry::version::version;
use farm_telemetry::{HttpServer, Shutdown};

/// Farm telemetry API server.
#[derive(Parser, Debug)]
#[command(name = "farm-telemetry", disable_version_flag = true)]
struct Args {
    /// API server port
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Environment (development|staging|production)
    #[arg(long, env = "ENV")]
    env: Option<String>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Display version and exit
    #[arg(long)]
    version: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let version = version();

    if args.version {
        let logger = build_logger(&LoggingConfig::default());
        logger.info(&format!("Version:\t{version}"));
        let _ = logger.flush();
        return;
    }

    let config = match resolve_config(Overrides {
        config_path: args.config,
        port: args.port,
        env: args.env,
    }) {
        Ok(config) => config,
        Err(e) => build_logger(&LoggingConfig::default()).fatal(&e),
    };

    let logger = build_logger(&config.logging);
    logger.info("command-line flags have been parsed");
    init_observability(&config, &logger, &version);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => logger.fatal_with(&e, &properties([("addr", addr.to_string())])),
    };

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        let logger = logger.clone();
        tokio::spawn(async move {
            let signal = terminate_signal().await;
            logger.info_with("shutting down server", &properties([("signal", signal.to_string())]));
            shutdown.trigger();
        });
    }

    let server = HttpServer::new(&config, logger.clone(), FarmSnapshot::mock(Utc::now()));
    if let Err(e) = server.run(listener, shutdown.wait()).await {
        logger.fatal(&e);
    }
    let _ = logger.flush();
}
