//! API Routes
//!
//! Configures the Axum router with all document cache endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    add_handler, delete_handler, get_handler, health_handler, lock_handler, set_handler,
    unlock_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /documents` - Store a document
/// - `POST /documents` - Store a document if not cached yet
/// - `GET /documents/:id` - Retrieve a document
/// - `DELETE /documents/:id` - Delete a document
/// - `POST /documents/:id/lock` - Lock a document
/// - `DELETE /documents/:id/lock` - Unlock a document
/// - `GET /health` - Store liveness check
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
        .route("/documents", put(set_handler).post(add_handler))
        .route("/documents/:id", get(get_handler).delete(delete_handler))
        .route("/documents/:id/lock", post(lock_handler).delete(unlock_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
