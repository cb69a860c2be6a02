use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{download, handlers};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Health and config
    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config));

    // Retrieval links point at /download/{handle}
    Router::new()
        .nest("/api/v1", api_routes)
        .route("/download/{handle}", get(download::download_file))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
