//! Strict request body decoding.
//!
//! # Responsibilities
//! - Bound the amount of body data read from the client
//! - Decode exactly one JSON value into a typed destination
//! - Translate decoder failures into messages safe to show to clients
//!
//! # Design Decisions
//! - The limit is enforced while streaming, never after buffering everything
//! - Unknown keys are rejected by the destination (`#[serde(deny_unknown_fields)]`)
//! - Well-formedness is checked first, so syntax errors take precedence
//! - Offsets are byte positions in the body, counting the offending byte

use axum::body::Body;
use axum::extract::{FromRef, FromRequest, Request};
use axum::http::header;
use futures_util::StreamExt;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;
use serde_json::error::Category;
use serde_path_to_error::Segment;

use crate::http::response::ApiError;
use crate::http::server::AppState;

/// Why a request body could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("body contains badly-formed JSON (at character {offset})")]
    Syntax { offset: usize },

    #[error("body contains badly-formed JSON")]
    UnexpectedEof,

    #[error("body contains incorrect JSON type for field \"{field}\"")]
    FieldType { field: String },

    #[error("body contains incorrect JSON type (at character {offset})")]
    Type { offset: usize },

    #[error("body must not be empty")]
    Empty,

    #[error("body contains unknown key \"{field}\"")]
    UnknownField { field: String },

    #[error("body must not be larger than {limit} bytes")]
    TooLarge { limit: usize },

    #[error("body contains duplicate key \"{field}\"")]
    DuplicateField { field: String },

    #[error("body must only contain a single JSON value")]
    MultipleValues,

    #[error("{0}")]
    Other(String),
}

/// Read and decode the body of `request`, reading at most `limit` bytes.
pub async fn read_json<T: DeserializeOwned>(request: Request, limit: usize) -> Result<T, DecodeError> {
    let declared = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    if declared.is_some_and(|len| len > limit as u64) {
        return Err(DecodeError::TooLarge { limit });
    }

    read_json_body(request.into_body(), limit).await
}

/// Decode a body that has not been checked against any declared length.
pub async fn read_json_body<T: DeserializeOwned>(body: Body, limit: usize) -> Result<T, DecodeError> {
    let bytes = read_limited(body, limit).await?;
    decode(&bytes)
}

async fn read_limited(body: Body, limit: usize) -> Result<Vec<u8>, DecodeError> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DecodeError::Other(e.to_string()))?;
        if buf.len() + chunk.len() > limit {
            return Err(DecodeError::TooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf)
}

/// Decode exactly one JSON value from `body`.
///
/// The first value is checked for well-formedness before it is matched
/// against `T`, so a syntax error is reported even when an unknown key or a
/// wrong type comes earlier in the body.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, DecodeError> {
    if body.iter().all(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r')) {
        return Err(DecodeError::Empty);
    }

    let mut syntax = serde_json::Deserializer::from_slice(body);
    IgnoredAny::deserialize(&mut syntax).map_err(|e| syntax_error(body, &e))?;

    let mut de = serde_json::Deserializer::from_slice(body);
    let value = serde_path_to_error::deserialize(&mut de).map_err(|e| classify(body, e))?;
    de.end().map_err(|_| DecodeError::MultipleValues)?;
    Ok(value)
}

fn syntax_error(body: &[u8], err: &serde_json::Error) -> DecodeError {
    match err.classify() {
        Category::Eof => DecodeError::UnexpectedEof,
        _ => DecodeError::Syntax {
            offset: byte_offset(body, err.line(), err.column()),
        },
    }
}

fn classify(body: &[u8], err: serde_path_to_error::Error<serde_json::Error>) -> DecodeError {
    let in_field = err.path().iter().any(|s| matches!(s, Segment::Map { .. }));
    let field = err.path().to_string();
    let err = err.into_inner();
    let offset = byte_offset(body, err.line(), err.column());

    match err.classify() {
        Category::Syntax => DecodeError::Syntax { offset },
        Category::Eof => DecodeError::UnexpectedEof,
        Category::Data => {
            let message = err.to_string();
            if let Some(name) = quoted_field(&message, "unknown field `") {
                DecodeError::UnknownField { field: name.to_string() }
            } else if let Some(name) = quoted_field(&message, "duplicate field `") {
                DecodeError::DuplicateField { field: name.to_string() }
            } else if is_type_mismatch(&message) {
                if in_field {
                    DecodeError::FieldType { field }
                } else {
                    DecodeError::Type { offset }
                }
            } else {
                DecodeError::Other(message)
            }
        }
        Category::Io => DecodeError::Other(err.to_string()),
    }
}

/// Convert a 1-based line and column into the number of bytes consumed.
fn byte_offset(body: &[u8], line: usize, column: usize) -> usize {
    let line_start: usize = body
        .split_inclusive(|b| *b == b'\n')
        .take(line.saturating_sub(1))
        .map(<[u8]>::len)
        .sum();
    line_start + column
}

fn quoted_field<'a>(message: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = message.strip_prefix(prefix)?;
    rest.split('`').next()
}

fn is_type_mismatch(message: &str) -> bool {
    ["invalid type:", "invalid value:", "invalid length"]
        .iter()
        .any(|p| message.starts_with(p))
}

/// JSON body extractor that applies the strict decoding rules and the
/// configured size limit.
#[derive(Debug, Clone)]
pub struct StrictJson<T>(pub T);

impl<S, T> FromRequest<S> for StrictJson<T>
where
    AppState: FromRef<S>,
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let limit = AppState::from_ref(state).max_body_bytes;
        read_json(req, limit).await.map(StrictJson).map_err(ApiError::from)
    }
}
