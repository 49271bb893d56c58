//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → middleware/ (request log, panic isolation)
//!     → handler
//!         query.rs (query string readers)
//!         request.rs (strict JSON body decoding)
//!     → envelope.rs (JSON envelope responses)
//!     → response.rs (error responses)
//!     → Send to client
//! ```

pub mod envelope;
pub mod middleware;
pub mod query;
pub mod request;
pub mod response;
pub mod server;

pub use envelope::{write_json, Envelope};
pub use middleware::request_log::X_REQUEST_ID;
pub use query::QueryString;
pub use request::{read_json, DecodeError, StrictJson};
pub use response::ApiError;
pub use server::{AppState, HttpServer};
