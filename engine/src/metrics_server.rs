//! HTTP exposition of metrics and cycle health.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tokio::sync::broadcast;

use crate::{BatchScheduler, EngineMetrics};

#[derive(Clone)]
struct ServerState {
    metrics: Arc<EngineMetrics>,
    scheduler: Arc<BatchScheduler>,
}

pub fn router(metrics: Arc<EngineMetrics>, scheduler: Arc<BatchScheduler>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(ServerState { metrics, scheduler })
}

async fn metrics_handler(State(state): State<ServerState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn health_handler(State(state): State<ServerState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "cycles": state.scheduler.stats(),
    }))
}

/// Serve until shutdown is signalled.
pub async fn serve(
    addr: SocketAddr,
    metrics: Arc<EngineMetrics>,
    scheduler: Arc<BatchScheduler>,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "metrics server listening");
    axum::serve(listener, router(metrics, scheduler))
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await
}
