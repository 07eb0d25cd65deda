//! Seismic Radar HTTP API
//!
//! Read-only view of the score cache:
//! - `GET /api/score` latest composite score
//! - `GET /api/quakes` merged event list
//! - `GET /health` liveness
//!
//! Handlers only read the cache; they never wait on a running cycle.

use std::future::Future;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use radar_runtime::CacheReader;

pub mod health;
pub mod score;

pub use health::*;
pub use score::*;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub cache: CacheReader,
}

impl AppState {
    pub fn new(cache: CacheReader) -> Self {
        Self { cache }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(score_routes())
        .merge(health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve the API until `shutdown` resolves
pub async fn serve<F>(state: AppState, bind_addr: &str, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("Seismic Radar listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
