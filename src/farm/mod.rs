//! Farm telemetry snapshots.
//!
//! Read-only sensor records for the herd, the robo-dog and the drone, held in
//! memory and served by the handlers in `handlers.rs`.

pub mod handlers;
pub mod models;
pub mod snapshot;

pub use models::{Cow, Drone, FarmState, RoboDog};
pub use snapshot::FarmSnapshot;
