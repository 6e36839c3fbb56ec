//! Health check handler.

use axum::{extract::State, Json};

use crate::state::AppState;
use crate::types::HealthResponse;

/// GET /health and /agent/health - Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.config.uptime_seconds(),
    })
}
