//! Health Routes
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;

/// GET /health/live
///
/// Returns 200 if the process is alive, no dependency checks.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health
///
/// Full health status with socket and stream counters.
/// A server that has never published a sample reports `idle`.
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let samples_published = state.hub.published_count();
    let status = if samples_published > 0 { "healthy" } else { "idle" };

    Json(HealthResponse {
        status: status.to_string(),
        connections: state.hub.connection_count().await,
        clients: state.hub.joined_count().await,
        samples_published,
        started_at: state.started_at,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
