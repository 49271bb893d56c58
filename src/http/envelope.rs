//! JSON envelope encoding.
//!
//! Every response body is a JSON object keyed by what it carries
//! (`{"cow": {...}}`, `{"error": "..."}`), followed by a newline.

use std::collections::BTreeMap;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use serde::Serialize;
use serde_json::{Map, Value};

/// A JSON object wrapping response data under semantic keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Envelope(Map<String, Value>);

impl Envelope {
    pub fn new(key: &str, value: impl Serialize) -> Result<Self, serde_json::Error> {
        Self::default().with(key, value)
    }

    /// Add another key. Fails if `value` cannot be represented as JSON.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Result<Self, serde_json::Error> {
        self.0.insert(key.to_string(), serde_json::to_value(value)?);
        Ok(self)
    }

    /// `{"error": message}`
    pub fn error(message: impl Into<String>) -> Self {
        let mut map = Map::new();
        map.insert("error".to_string(), Value::String(message.into()));
        Self(map)
    }

    /// `{"error": {field: message, ...}}`
    pub fn errors(errors: &BTreeMap<String, String>) -> Self {
        let fields = errors
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        let mut map = Map::new();
        map.insert("error".to_string(), Value::Object(fields));
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Serialize `data` into a JSON response.
///
/// Nothing is produced if serialization fails, so the caller is still free
/// to answer with a different status.
pub fn write_json<T: Serialize + ?Sized>(
    status: StatusCode,
    data: &T,
    headers: Option<HeaderMap>,
) -> Result<Response, serde_json::Error> {
    let mut body = serde_json::to_vec(data)?;
    body.push(b'\n');

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    if let Some(headers) = headers {
        response.headers_mut().extend(headers);
    }
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}
