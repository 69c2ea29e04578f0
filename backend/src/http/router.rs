//! Router configuration for the HTTP API.
//!
//! This module sets up all routes and middleware (tracing, request timeout,
//! body limit) and creates the axum router ready for serving.

use std::time::Duration;

use axum::{extract::DefaultBodyLimit, http::StatusCode, routing::get, Router};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::handlers;
use super::state::AppState;

/// Upper bound for a whole request, including the database round trip.
///
/// Expiry is a server-side stall and answers 504.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Reader bodies are a handful of short strings.
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Create the main application router with all routes and middleware.
///
/// Method mismatches on a known path answer 405; unknown paths answer 404.
pub fn create_router(state: AppState) -> Router {
    create_router_with_timeout(state, REQUEST_TIMEOUT)
}

/// Same as [`create_router`] with a custom whole-request deadline.
pub fn create_router_with_timeout(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/readers",
            get(handlers::list_readers).post(handlers::create_reader),
        )
        .route(
            "/readers/{id}",
            get(handlers::get_reader)
                .put(handlers::update_reader)
                .delete(handlers::delete_reader),
        )
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let repo = Arc::new(LocalRepository::new());
        let state = AppState::new(repo);
        let _router = create_router(state);
    }
}
