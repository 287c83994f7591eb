//! HTTP routes.

mod api;

pub use api::{AskParams, AskResponse, MoviesResponse, StatusMessage};

use crate::AppState;
use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(api::root))
        .route("/ask", get(api::ask))
        .route("/movies", get(api::movies))
        .route("/health", get(api::health))
        // No authentication; any origin may call the API
        .layer(CorsLayer::permissive())
        .with_state(state)
}
