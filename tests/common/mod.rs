//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use chrono::Utc;
use farm_telemetry::config::AppConfig;
use farm_telemetry::farm::FarmSnapshot;
use farm_telemetry::http::server::AppState;
use farm_telemetry::observability::{Level, Logger};
use tower::ServiceExt;

/// In-memory log sink shared between a logger and a test.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn lines(&self) -> Vec<serde_json::Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    /// Records with the given `level` string.
    pub fn at_level(&self, level: &str) -> Vec<serde_json::Value> {
        self.lines()
            .into_iter()
            .filter(|l| l["level"] == level)
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// App state over the demo snapshot, logging into a fresh buffer.
pub fn test_state(config: &AppConfig) -> (AppState, SharedBuffer) {
    let buf = SharedBuffer::default();
    let logger = Arc::new(Logger::new(buf.clone(), Level::Info));
    let state = AppState::new(config, logger, FarmSnapshot::mock(Utc::now()));
    (state, buf)
}

pub async fn send(router: Router, request: Request<Body>) -> Response {
    router.oneshot(request).await.unwrap()
}

pub async fn body_json(res: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
