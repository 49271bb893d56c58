//! Panic isolation.

use std::panic::AssertUnwindSafe;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use futures_util::FutureExt;

use crate::http::response::{
    log_server_error, request_properties, server_error_response, ServerErrorDetail,
};
use crate::http::server::AppState;
use crate::observability::panics::{panic_message, with_location};

/// Turn a panic anywhere below this layer into a 500 that closes the
/// connection. Also logs the detail of any 500 produced by a handler.
pub async fn recover_panic(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => {
            if let Some(ServerErrorDetail(detail)) = response.extensions().get() {
                log_server_error(&state.logger, &method, &uri, detail);
            }
            response
        }
        Err(payload) => {
            let mut headers = HeaderMap::new();
            headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
            server_error_response(
                &state.logger,
                &panic_message(payload.as_ref()),
                &with_location(request_properties(&method, &uri)),
                Some(headers),
            )
        }
    }
}
