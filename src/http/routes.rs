use super::handlers::{self, MEDIA_PATH};
use super::state::AppState;
use crate::reply::CONTINUE_PATH;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/", get(handlers::health_check))
        .route("/health", get(handlers::health_check))
        // Call webhooks
        .route("/voice", post(handlers::voice))
        .route(
            CONTINUE_PATH,
            get(handlers::voice_stream_continue).post(handlers::voice_stream_continue),
        )
        // Media stream
        .route(MEDIA_PATH, get(handlers::media_stream))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
