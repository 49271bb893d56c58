//! Farm telemetry API library.
//!
//! Serves read-only herd and fleet telemetry over JSON, behind a structured
//! logger, strict request decoding and panic isolation.

pub mod config;
pub mod farm;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod validator;
pub mod version;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{BackgroundTasks, Shutdown};
pub use observability::Logger;
