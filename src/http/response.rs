//! Error responses.
//!
//! # Responsibilities
//! - Map handler failures to status codes and envelope bodies
//! - Keep internal error detail out of client-visible bodies
//! - Hand internal detail to the middleware that logs it
//!
//! # Design Decisions
//! - Client errors carry a precise message; server errors carry a fixed one
//! - A 500 is logged exactly once, by the panic-isolation middleware

use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};

use crate::http::envelope::{write_json, Envelope};
use crate::http::request::DecodeError;
use crate::observability::logging::{properties, Logger, Properties};
use crate::validator::Validator;

pub const SERVER_ERROR_MESSAGE: &str =
    "The server encountered a problem and could not process your request";

/// Internal detail behind a 500, carried in the response extensions until it
/// is logged.
#[derive(Debug, Clone)]
pub struct ServerErrorDetail(pub String);

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("the requested resource could not be found")]
    NotFound,

    #[error("the {0} method is not supported for this resource")]
    MethodNotAllowed(Method),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("failed validation: {0}")]
    FailedValidation(Validator),

    #[error("{0}")]
    Internal(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::BadRequest(_) | ApiError::Decode(_) => StatusCode::BAD_REQUEST,
            ApiError::FailedValidation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Internal(detail) => {
                let mut res = generic_server_error(None);
                res.extensions_mut().insert(ServerErrorDetail(detail.clone()));
                return res;
            }
            ApiError::FailedValidation(v) => Ok(Envelope::errors(v.errors())),
            other => Ok(Envelope::error(other.to_string())),
        };

        match body.and_then(|env| write_json(status, &env, None)) {
            Ok(res) => res,
            Err(e) => {
                let mut res = generic_server_error(None);
                res.extensions_mut().insert(ServerErrorDetail(e.to_string()));
                res
            }
        }
    }
}

/// `request_method` and `request_url` properties for an error record.
pub fn request_properties(method: &Method, uri: &Uri) -> Properties {
    properties([
        ("request_method", method.to_string()),
        ("request_url", uri.to_string()),
    ])
}

/// Log the internal detail of a 500 together with the request that caused it.
pub fn log_server_error(logger: &Logger, method: &Method, uri: &Uri, detail: &str) {
    logger.error_with(&detail, &request_properties(method, uri));
}

/// Log `detail` with `properties` and build the generic 500.
pub fn server_error_response(
    logger: &Logger,
    detail: &str,
    properties: &Properties,
    headers: Option<HeaderMap>,
) -> Response {
    logger.error_with(&detail, properties);
    generic_server_error(headers)
}

fn generic_server_error(headers: Option<HeaderMap>) -> Response {
    let env = Envelope::error(SERVER_ERROR_MESSAGE);
    match write_json(StatusCode::INTERNAL_SERVER_ERROR, &env, headers) {
        Ok(res) => res,
        // Unreachable for a string-only envelope.
        Err(_) => {
            let mut res = (StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR_MESSAGE).into_response();
            res.headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
            res
        }
    }
}

/// Parse a resource ID path segment; anything but a positive integer is a 404.
pub fn read_id_param(raw: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(ApiError::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::logging::{Level, SharedBuffer};

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_read_id_param() {
        assert_eq!(read_id_param("3").unwrap(), 3);
        assert!(matches!(read_id_param("0"), Err(ApiError::NotFound)));
        assert!(matches!(read_id_param("-1"), Err(ApiError::NotFound)));
        assert!(matches!(read_id_param("cow"), Err(ApiError::NotFound)));
    }

    #[tokio::test]
    async fn test_failed_validation_body() {
        let mut v = Validator::new();
        v.add_error("limit", "must be an integer value");

        let res = ApiError::FailedValidation(v).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            body_json(res).await,
            serde_json::json!({"error": {"limit": "must be an integer value"}})
        );
    }

    #[tokio::test]
    async fn test_decode_error_is_bad_request() {
        let res = ApiError::from(DecodeError::Empty).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await["error"], "body must not be empty");
    }

    #[tokio::test]
    async fn test_internal_detail_is_not_leaked() {
        let res = ApiError::Internal("db socket closed".into()).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            res.extensions().get::<ServerErrorDetail>().unwrap().0,
            "db socket closed"
        );
        assert_eq!(body_json(res).await["error"], SERVER_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_server_error_response_logs_request() {
        let buf = SharedBuffer::default();
        let logger = Logger::new(buf.clone(), Level::Info);
        let uri: Uri = "/api/cows/9?verbose=1".parse().unwrap();

        let props = request_properties(&Method::GET, &uri);
        let res = server_error_response(&logger, "boom", &props, None);
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let line = &buf.lines()[0];
        assert_eq!(line["level"], "ERROR+STACK");
        assert_eq!(line["message"], "boom");
        assert_eq!(line["properties"]["request_method"], "GET");
        assert_eq!(line["properties"]["request_url"], "/api/cows/9?verbose=1");
    }
}
