//! Typed readers over the URL query string.
//!
//! Absent or empty parameters fall back to the caller's default. Invalid
//! values are reported into a [`Validator`] instead of failing the request,
//! so a handler can return every problem in one response.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::validator::Validator;

/// Decoded query parameters in the order they appeared.
#[derive(Debug, Clone, Default)]
pub struct QueryString {
    pairs: Vec<(String, String)>,
}

impl QueryString {
    /// Parse a raw (still percent-encoded) query string.
    pub fn parse(raw: &str) -> Self {
        Self {
            pairs: url::form_urlencoded::parse(raw.as_bytes())
                .into_owned()
                .collect(),
        }
    }

    /// First value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }
}

impl<S> FromRequestParts<S> for QueryString
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.uri.query().map(Self::parse).unwrap_or_default())
    }
}

pub fn read_string(qs: &QueryString, key: &str, default: &str) -> String {
    qs.non_empty(key).unwrap_or(default).to_string()
}

/// Split a comma-separated value into its parts.
pub fn read_csv(qs: &QueryString, key: &str, default: Vec<String>) -> Vec<String> {
    match qs.non_empty(key) {
        Some(csv) => csv.split(',').map(str::to_string).collect(),
        None => default,
    }
}

/// Parse an integer value, recording `key` in `v` when it does not parse.
pub fn read_int(qs: &QueryString, key: &str, default: i64, v: &mut Validator) -> i64 {
    let Some(raw) = qs.non_empty(key) else {
        return default;
    };
    match raw.parse() {
        Ok(n) => n,
        Err(_) => {
            v.add_error(key, "must be an integer value");
            default
        }
    }
}
