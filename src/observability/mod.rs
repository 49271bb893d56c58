//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Application code:
//!     → logging.rs (JSON lines through the shared Logger)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Framework diagnostics (axum, hyper, tower-http):
//!     → tracing.rs (tracing-subscriber fmt layer)
//!     → LogSink → Logger at ERROR severity
//!
//! Panics:
//!     → panics.rs hook (silences stderr, records location)
//!     → caught by the middleware or the task launcher → one ERROR record
//! ```
//!
//! # Design Decisions
//! - One sink, one lock: every line on stdout comes from the Logger
//! - Metrics are cheap (atomic updates behind the `metrics` facade)
//! - The Prometheus exporter is optional and off by default

pub mod logging;
pub mod metrics;
pub mod panics;
pub mod tracing;

pub use logging::{Level, LogSink, Logger, Properties};
