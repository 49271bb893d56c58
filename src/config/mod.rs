//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → optional TOML file (loader.rs)
//!     → PORT / ENV environment and command-line overrides (main.rs)
//!     → validation.rs (semantic checks, all errors at once)
//!     → AppConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty file is a valid config
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{finalize, load_config, ConfigError};
pub use schema::{AppConfig, LoggingConfig, ObservabilityConfig, ServerConfig};
pub use validation::validate_config;
