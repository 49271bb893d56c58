//! Middleware applied around the whole router.
//!
//! # Data Flow
//! ```text
//! request
//!     → request_log.rs (log method/URL, request ID, metrics)
//!     → recover.rs (catch panics, log 500 detail)
//!     → timeout
//!     → router / handler
//! ```
//!
//! # Design Decisions
//! - Request logging sits outside the panic guard so every request is logged
//! - The panic guard is the single place a 500 is logged

pub mod recover;
pub mod request_log;

pub use recover::recover_panic;
pub use request_log::log_request;
