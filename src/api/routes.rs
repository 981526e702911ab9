//! API route table.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, ApiState};

/// Build the API router.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/models", get(handlers::models))
        .route("/grades/:grade/targets", get(handlers::grade_targets))
        .route("/predict", post(handlers::predict))
        .with_state(state)
}
