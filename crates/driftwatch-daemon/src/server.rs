use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::error::DaemonError;

const HEADER_READ_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct ServerState {
    pub started_at: Instant,
    pub ready: Arc<AtomicBool>,
    pub metrics_handle: PrometheusHandle,
}

fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .route("/-/healthy", get(healthy_handler))
        .route("/-/ready", get(ready_handler))
        .layer(TimeoutLayer::new(HEADER_READ_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the metrics/health HTTP surface on `port` until `token` is
/// cancelled, at which point the listener is closed gracefully.
pub async fn serve(port: u16, state: ServerState, token: CancellationToken) -> Result<(), DaemonError> {
    let app = build_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            token.cancelled().await;
        })
        .await?;

    Ok(())
}

async fn metrics_handler(State(state): State<ServerState>) -> impl IntoResponse {
    state.metrics_handle.render()
}

async fn health_handler(State(state): State<ServerState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "uptime": state.started_at.elapsed().as_secs(),
    }))
}

async fn healthy_handler() -> StatusCode {
    StatusCode::OK
}

async fn ready_handler(State(state): State<ServerState>) -> StatusCode {
    if state.ready.load(Ordering::Relaxed) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
