//! Score and quake list endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::AppState;

/// Body returned before the first cycle has published
#[derive(Debug, Serialize)]
pub struct WarmingUp {
    pub status: &'static str,
    pub message: &'static str,
}

impl WarmingUp {
    pub fn new() -> Self {
        Self {
            status: "warming_up",
            message: "No score has been computed yet, retry shortly",
        }
    }
}

impl Default for WarmingUp {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoResponse for WarmingUp {
    fn into_response(self) -> Response {
        (StatusCode::SERVICE_UNAVAILABLE, Json(self)).into_response()
    }
}

/// GET /api/score
pub async fn get_score(State(state): State<AppState>) -> Response {
    match state.cache.read() {
        Some(entry) => Json(&entry.score).into_response(),
        None => WarmingUp::new().into_response(),
    }
}

/// GET /api/quakes
pub async fn get_quakes(State(state): State<AppState>) -> Response {
    match state.cache.read() {
        Some(entry) => Json(entry.quake_list()).into_response(),
        None => WarmingUp::new().into_response(),
    }
}

pub fn score_routes() -> Router<AppState> {
    Router::new()
        .route("/api/score", get(get_score))
        .route("/api/quakes", get(get_quakes))
}
