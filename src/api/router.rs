use axum::{middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware::logging_middleware;
use super::openapi::{self, OPENAPI_PATH};
use super::state::AppState;
use super::users::{self, USERS_PATH};

/// Create the full router with application state
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/live", get(health::live_check))
        .route(OPENAPI_PATH, get(openapi::openapi_json))
        .nest(USERS_PATH, users::create_users_router())
        .with_state(state)
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}
