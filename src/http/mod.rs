//! HTTP surface of the gateway.
//!
//! | Method | Path       | Query                         | Result                  |
//! |--------|------------|-------------------------------|-------------------------|
//! | GET    | `/health`  |                               | `{"ok": true}`          |
//! | GET    | `/metrics` |                               | Prometheus text format  |
//! | POST   | `/`        | `preset`                      | empty 200               |
//! | GET    | `/`        | `namespace`, `name` (`*`)     | `{"status": "..."}`     |
//! | DELETE | `/`        | `namespace`, `name`           | empty 200               |
//!
//! Failures are `{"error": "..."}` with the status code set by [`ApiError`].

pub mod error;

pub use error::ApiError;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::gateway::JobControl;
use crate::metrics::Metrics;

/// Driver name used for status queries without `name`.
pub const WILDCARD_NAME: &str = "*";

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

#[derive(Clone)]
pub struct ApiState {
    pub control: Arc<dyn JobControl>,
    pub metrics: Arc<Metrics>,
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
}

#[derive(Serialize)]
struct StatusResponse {
    status: String,
}

/// Query string pairs in the order they appeared.
///
/// A repeated key resolves to its first value.
struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    fn first(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    // Empty values count as missing.
    fn required(&self, key: &str) -> Result<String, ApiError> {
        self.first(key)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ApiError::missing_parameter(key))
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route(
            "/",
            post(submit_handler)
                .get(status_handler)
                .delete(kill_handler),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on `addr` until `shutdown` is cancelled.
///
/// Shutdown only stops accepting requests; submissions already dispatched keep
/// running in their own tasks.
pub async fn run_server(
    addr: SocketAddr,
    state: ApiState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Starting HTTP server");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

async fn metrics_handler(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let body = state.metrics.gather().map_err(ApiError::unexpected)?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        body,
    ))
}

async fn submit_handler(
    State(state): State<ApiState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<StatusCode, ApiError> {
    let preset = QueryParams(pairs).required("preset")?;

    state.control.submit(&preset)?;
    Ok(StatusCode::OK)
}

async fn status_handler(
    State(state): State<ApiState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<StatusResponse>, ApiError> {
    let params = QueryParams(pairs);
    let namespace = params.required("namespace")?;
    let name = params
        .first("name")
        .filter(|n| !n.is_empty())
        .unwrap_or(WILDCARD_NAME)
        .to_string();

    let status = state.control.status(&namespace, &name).await;
    Ok(Json(StatusResponse { status }))
}

async fn kill_handler(
    State(state): State<ApiState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<StatusCode, ApiError> {
    let params = QueryParams(pairs);
    let namespace = params.required("namespace")?;
    let name = params.required("name")?;

    state.control.kill(&namespace, &name);
    Ok(StatusCode::OK)
}
