//! Health and root endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::SharedState;

#[derive(Serialize)]
pub struct RootResponse {
    pub message: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub llm_available: bool,
    pub uptime_seconds: u64,
    pub version: String,
}

/// GET / - service banner
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "visionpipe API".to_string(),
        status: "running".to_string(),
    })
}

/// GET /health - liveness and dependency status
///
/// Stays functional with no model loaded; `model_loaded` tells a client the
/// prediction path will answer 503 until a checkpoint is available.
pub async fn health_check(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        model_loaded: state.predictor.is_some(),
        llm_available: state.llm.available(),
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
