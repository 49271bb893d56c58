//! Bridge from `tracing` events into the JSON logger.
//!
//! axum, hyper and tower-http report their own problems through `tracing`.
//! A fmt layer writing into a [`LogSink`] turns each of those events into an
//! `ERROR` record, so nothing bypasses the logger.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::observability::logging::LogSink;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn";

pub fn subscriber(
    sink: LogSink,
    filter: EnvFilter,
) -> impl tracing::Subscriber + Send + Sync + 'static {
    tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(sink)
            .with_ansi(false)
            .without_time(),
    )
}

/// Install the global subscriber, filtered by `RUST_LOG`.
/// Fails if one is already installed.
pub fn init(sink: LogSink) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());
    subscriber(sink, filter).try_init()
}
