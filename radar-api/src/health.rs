//! Health check endpoint

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}

/// GET /health
///
/// Reports liveness only; a cold cache is still healthy.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "seismic-radar".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
