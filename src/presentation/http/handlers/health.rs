//! Health check endpoint

use axum::{Json, extract::State};
use serde::Serialize;

use crate::presentation::http::state::AppState;

/// Liveness payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `healthy` when the server answers.
    pub status: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Seconds since start.
    pub uptime: u64,
    /// Asset cache lifecycle state in edge mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_cache: Option<String>,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: crate::VERSION,
        uptime: state.uptime_seconds(),
        asset_cache: state
            .edge
            .as_ref()
            .map(|edge| format!("{:?}", edge.cache.state()).to_lowercase()),
    })
}
