//! API Routes
//!
//! Configures the Axum router for the client HTTP facade.

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{health_handler, image_handler, stats_handler, strategy_handler, AppState};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /images/:id` - Image bytes, from cache or backend
/// - `GET /stats` - Performance report
/// - `PUT /strategy` - Swap in an empty store with another policy
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/images/:id", get(image_handler))
        .route("/stats", get(stats_handler))
        .route("/strategy", put(strategy_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
