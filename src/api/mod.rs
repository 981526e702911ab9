//! REST API module using Axum
//!
//! HTTP surface for the composition optimizer:
//! - `GET /` service info, `GET /health`, `GET /models`
//! - `GET /grades/:grade/targets` catalog lookup without inference
//! - `POST /predict` full optimization report
//!
//! Every response uses the envelope in [`envelope`].

pub mod envelope;
pub mod handlers;
mod routes;

pub use handlers::ApiState;

use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::defaults::CORS_ORIGINS_ENV;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `ALLOYMIND_CORS_ORIGINS` to a comma-separated list of allowed origins
/// to let a browser front-end on another origin call the API.
fn build_cors_layer() -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);
    match std::env::var(CORS_ORIGINS_ENV) {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            base.allow_origin(allowed)
        }
        Err(_) => base,
    }
}

/// Create the complete application router.
pub fn create_app(state: ApiState) -> Router {
    routes::api_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}
