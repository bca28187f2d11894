//! API Routes
//!
//! Configures the Axum router with all inspection endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, health_handler, invalidate_handler, load_handler,
    resize_handler, snapshot_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/snapshot", get(snapshot_handler))
        .route("/entries/:key", delete(delete_handler))
        .route("/invalidate", post(invalidate_handler))
        .route("/clear", post(clear_handler))
        .route("/resize", put(resize_handler))
        .route("/load", post(load_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
