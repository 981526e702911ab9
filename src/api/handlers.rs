//! API route handlers
//!
//! All handlers return `Response` via [`ApiResponse::ok`] or
//! [`ApiErrorResponse`]. Inference runs on the blocking pool so the rayon
//! fan-out never stalls the async runtime.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};

use super::envelope::{ApiErrorResponse, ApiResponse};
use crate::catalog::SUPPORTED_GRADES;
use crate::pipeline::CompositionOptimizer;
use crate::types::{Composition, ModelPerformance, OptimizationRequest};

// ============================================================================
// API State
// ============================================================================

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub optimizer: Arc<CompositionOptimizer>,
    pub started_at: Instant,
}

impl ApiState {
    pub fn new(optimizer: Arc<CompositionOptimizer>) -> Self {
        Self {
            optimizer,
            started_at: Instant::now(),
        }
    }
}

// ============================================================================
// Response types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
    pub version: &'static str,
    pub available_models: Vec<String>,
    pub supported_grades: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `healthy` when every bundle the catalog references is loaded
    pub status: &'static str,
    pub models_loaded: usize,
    pub available_models: Vec<String>,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct ModelStatus {
    pub key: String,
    pub loaded: bool,
    /// Grades served by this bundle
    pub grades: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weights: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance: Option<ModelPerformance>,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelStatus>,
    pub total_loaded: usize,
}

#[derive(Debug, Serialize)]
pub struct GradeTargetsResponse {
    pub grade: String,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_grade: Option<&'static str>,
    pub target_specifications: Composition,
}

// ============================================================================
// Handlers
// ============================================================================

/// `GET /`
pub async fn root(State(state): State<ApiState>) -> Response {
    ApiResponse::ok(ServiceInfo {
        message: "AlloyMind Element Configuration API",
        version: env!("CARGO_PKG_VERSION"),
        available_models: loaded_keys(&state),
        supported_grades: SUPPORTED_GRADES.to_vec(),
    })
}

/// `GET /health`
pub async fn health(State(state): State<ApiState>) -> Response {
    let optimizer = &state.optimizer;
    let all_loaded = optimizer
        .catalog()
        .model_keys()
        .iter()
        .all(|k| optimizer.registry().contains(k));
    ApiResponse::ok(HealthResponse {
        status: if all_loaded { "healthy" } else { "degraded" },
        models_loaded: optimizer.registry().len(),
        available_models: loaded_keys(&state),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

/// `GET /models`
pub async fn models(State(state): State<ApiState>) -> Response {
    let optimizer = &state.optimizer;
    let models: Vec<ModelStatus> = optimizer
        .catalog()
        .model_keys()
        .into_iter()
        .map(|key| {
            let grades = optimizer
                .catalog()
                .grades()
                .filter(|g| g.model_key == key)
                .map(|g| g.id)
                .collect();
            match optimizer.registry().get(key) {
                Ok(model) => ModelStatus {
                    key: key.to_string(),
                    loaded: true,
                    grades,
                    weights: Some(model.predictor.weights()),
                    performance: model.performance.clone(),
                },
                Err(_) => ModelStatus {
                    key: key.to_string(),
                    loaded: false,
                    grades,
                    weights: None,
                    performance: None,
                },
            }
        })
        .collect();

    ApiResponse::ok(ModelsResponse {
        total_loaded: models.iter().filter(|m| m.loaded).count(),
        models,
    })
}

/// `GET /grades/:grade/targets`
pub async fn grade_targets(State(state): State<ApiState>, Path(grade): Path<String>) -> Response {
    match state.optimizer.catalog().get(&grade) {
        Ok(g) => ApiResponse::ok(GradeTargetsResponse {
            grade: g.id.to_string(),
            description: g.description,
            base_grade: g.base_grade,
            target_specifications: g.targets,
        }),
        Err(e) => ApiErrorResponse::bad_request(e.to_string()),
    }
}

/// `POST /predict`
pub async fn predict(
    State(state): State<ApiState>,
    body: Result<Json<OptimizationRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected prediction request body");
            return ApiErrorResponse::bad_request(rejection.body_text());
        }
    };

    let optimizer = Arc::clone(&state.optimizer);
    match tokio::task::spawn_blocking(move || optimizer.optimize(&request)).await {
        Ok(Ok(report)) => ApiResponse::ok(report),
        Ok(Err(e)) => {
            if e.is_client_error() {
                warn!(error = %e, "Prediction rejected");
            } else {
                error!(error = %e, "Prediction failed");
            }
            ApiErrorResponse::from_pipeline(&e)
        }
        Err(e) => {
            error!(error = %e, "Prediction task panicked");
            ApiErrorResponse::internal("Prediction task failed")
        }
    }
}

fn loaded_keys(state: &ApiState) -> Vec<String> {
    state
        .optimizer
        .registry()
        .loaded_keys()
        .into_iter()
        .map(str::to_string)
        .collect()
}
