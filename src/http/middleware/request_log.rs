//! Request logging and request IDs.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::http::server::AppState;
use crate::observability::logging::properties;
use crate::observability::metrics;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Log every inbound request before handing it on, then tag the response
/// with the request ID and record request metrics.
pub async fn log_request(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let request_id = match request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        Some(id) => id.to_string(),
        None => {
            let id = Uuid::new_v4().to_string();
            if let Ok(value) = HeaderValue::from_str(&id) {
                request.headers_mut().insert(X_REQUEST_ID, value);
            }
            id
        }
    };
    let method = request.method().clone();

    state.logger.info_with(
        "request received",
        &properties([
            ("method", method.to_string()),
            ("url", request.uri().to_string()),
            ("request_id", request_id.clone()),
        ]),
    );

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }
    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}
