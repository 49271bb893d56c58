//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request logging, panic isolation, timeout)
//! - Bind server to listener
//! - Drain background tasks once the listener has stopped

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{http::StatusCode, middleware::from_fn_with_state, routing::get, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

use crate::config::AppConfig;
use crate::farm::{handlers, FarmSnapshot};
use crate::http::middleware::{log_request, recover_panic};
use crate::lifecycle::BackgroundTasks;
use crate::observability::logging::{properties, Logger};
use crate::version::version;

/// Application state injected into handlers and middleware.
#[derive(Clone, Debug)]
pub struct AppState {
    pub logger: Arc<Logger>,
    pub background: BackgroundTasks,
    pub snapshot: Arc<FarmSnapshot>,
    pub environment: String,
    pub version: String,
    /// Upper bound for JSON request bodies.
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(config: &AppConfig, logger: Arc<Logger>, snapshot: FarmSnapshot) -> Self {
        Self {
            background: BackgroundTasks::new(Arc::clone(&logger)),
            logger,
            snapshot: Arc::new(snapshot),
            environment: config.server.env.clone(),
            version: version(),
            max_body_bytes: config.server.max_body_bytes,
        }
    }
}

/// The farm API routes, without fallbacks or middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/healthcheck", get(handlers::healthcheck))
        .route("/api/debug/vars", get(handlers::debug_vars))
        .route("/api/farm/state", get(handlers::get_farm_state))
        .route("/api/cows", get(handlers::list_cows))
        .route("/api/cows/{id}", get(handlers::get_cow))
        .route("/api/robodog", get(handlers::get_robodog))
        .route("/api/drone", get(handlers::get_drone))
}

/// Add JSON fallbacks and the middleware stack to `routes`.
///
/// Outermost first: request logging, panic isolation, request timeout.
pub fn app(state: AppState, routes: Router<AppState>, request_timeout: Duration) -> Router {
    routes
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn_with_state(state.clone(), log_request))
                .layer(from_fn_with_state(state.clone(), recover_panic))
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    request_timeout,
                )),
        )
        .with_state(state)
}

/// HTTP server for the farm API.
pub struct HttpServer {
    router: Router,
    state: AppState,
    shutdown_timeout: Duration,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: &AppConfig, logger: Arc<Logger>, snapshot: FarmSnapshot) -> Self {
        let state = AppState::new(config, logger, snapshot);
        let router = app(state.clone(), routes(), config.server.request_timeout());
        Self {
            router,
            state,
            shutdown_timeout: config.server.shutdown_timeout(),
        }
    }

    /// Serve until `shutdown` resolves, then wait for background tasks.
    ///
    /// Returns false when background tasks were still running at the
    /// shutdown deadline.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<bool>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        let logger = Arc::clone(&self.state.logger);
        logger.info_with(
            "starting server",
            &properties([
                ("addr", addr.to_string()),
                ("env", self.state.environment.clone()),
            ]),
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        logger.info_with(
            "completing background tasks",
            &properties([("outstanding", self.state.background.outstanding().to_string())]),
        );
        let drained = self.state.background.drain(self.shutdown_timeout).await;
        if drained {
            logger.info_with("stopped server", &properties([("addr", addr.to_string())]));
        } else {
            logger.error_with(
                &"background tasks did not finish before the shutdown deadline",
                &properties([("outstanding", self.state.background.outstanding().to_string())]),
            );
        }
        Ok(drained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::logging::{Level, SharedBuffer};
    use axum::body::Body;
    use axum::http::Request;
    use chrono::Utc;
    use tower::ServiceExt;

    fn test_app() -> (Router, SharedBuffer) {
        let buf = SharedBuffer::default();
        let logger = Arc::new(Logger::new(buf.clone(), Level::Info));
        let state = AppState::new(&AppConfig::default(), logger, FarmSnapshot::mock(Utc::now()));
        (app(state, routes(), Duration::from_secs(5)), buf)
    }

    async fn get(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let res = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_healthcheck() {
        let (router, _buf) = test_app();
        let (status, body) = get(router, "/api/healthcheck").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "available");
        assert_eq!(body["system_info"]["environment"], "development");
        assert_eq!(body["system_info"]["version"], version());
    }

    #[tokio::test]
    async fn test_list_cows_filters() {
        let (router, _buf) = test_app();
        let (status, body) = get(router, "/api/cows?status=sick").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["cows"][0]["name"], "Moo");

        let (router, _buf) = test_app();
        let (_, body) = get(router, "/api/cows?zone=Pasture%20A&limit=2").await;
        assert_eq!(body["total"], 2);
        assert_eq!(body["cows"][0]["location"]["zone"], "Pasture A");
    }

    #[tokio::test]
    async fn test_list_cows_rejects_bad_query() {
        let (router, _buf) = test_app();
        let (status, body) = get(router, "/api/cows?status=grumpy&limit=abc").await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["status"], "must be one of healthy, sick, injured");
        assert_eq!(body["error"]["limit"], "must be an integer value");

        let (router, _buf) = test_app();
        let (status, body) = get(router, "/api/cows?limit=500").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["limit"], "must be a maximum of 100");
    }

    #[tokio::test]
    async fn test_get_cow() {
        let (router, _buf) = test_app();
        let (status, body) = get(router, "/api/cows/2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["cow"]["name"], "Daisy");

        for uri in ["/api/cows/42", "/api/cows/0", "/api/cows/daisy"] {
            let (router, _buf) = test_app();
            let (status, body) = get(router, uri).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{uri}");
            assert_eq!(body["error"], "the requested resource could not be found");
        }
    }

    #[tokio::test]
    async fn test_unknown_route_and_method() {
        let (router, _buf) = test_app();
        let (status, _) = get(router, "/api/horses").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (router, _buf) = test_app();
        let res = router
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/drone")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "the DELETE method is not supported for this resource");
    }

    #[tokio::test]
    async fn test_farm_state_reports_low_batteries() {
        let buf = SharedBuffer::default();
        let logger = Arc::new(Logger::new(buf.clone(), Level::Info));
        let state = AppState::new(&AppConfig::default(), logger, FarmSnapshot::mock(Utc::now()));
        let background = state.background.clone();
        let router = app(state, routes(), Duration::from_secs(5));

        let (status, body) = get(router, "/api/farm/state").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["farm_state"]["total_cows"], 5);

        assert!(background.drain(Duration::from_secs(5)).await);
        let alerts: Vec<_> = buf
            .lines()
            .into_iter()
            .filter(|l| l["message"] == "low battery")
            .collect();
        let devices: Vec<_> = alerts.iter().map(|l| l["properties"]["device"].clone()).collect();
        assert_eq!(devices, vec!["robodog", "drone"]);
        assert_eq!(alerts[0]["level"], "ERROR");
    }
}
