//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Parse flags → Load & validate config → Build logger → Tracing bridge → Metrics
//!
//! Runtime (background.rs):
//!     Handlers spawn detached tasks → counted, panics contained
//!
//! Shutdown (signals.rs, shutdown.rs):
//!     SIGTERM/SIGINT → Stop accepting → Finish in-flight requests
//!     → Drain background tasks (bounded) → Flush logger → Exit
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Shutdown has a deadline for background work

pub mod background;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use background::BackgroundTasks;
pub use shutdown::Shutdown;
