//! API Regression Tests
//!
//! In-process tests that build the Axum app via `create_app()` and exercise
//! every endpoint using `tower::ServiceExt::oneshot()`.
//! No binary spawn, no network port.

use std::collections::BTreeMap;
use std::sync::Arc;

use alloymind::api::{create_app, ApiState};
use alloymind::catalog::MULTI_GRADE_MODEL;
use alloymind::ensemble::{
    EnsembleModelBundle, LinearModel, ModelRegistry, RegressionModel, BUNDLE_FORMAT_VERSION,
};
use alloymind::optimization::ScoringSettings;
use alloymind::{CategoricalCodec, CompositionOptimizer, ElementSymbol, GradeCatalog};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

/// Registry with only the shared standard-grade bundle loaded.
fn multi_grade_registry() -> ModelRegistry {
    let models: BTreeMap<String, RegressionModel> = ElementSymbol::ALL
        .into_iter()
        .map(|e| {
            let model = RegressionModel::Linear(LinearModel {
                intercept: 0.0,
                coefficients: BTreeMap::from([(format!("{e}_Target_Config"), 1.0)]),
            });
            (e.target_column(), model)
        })
        .collect();
    let bundle = EnsembleModelBundle {
        version: BUNDLE_FORMAT_VERSION,
        model_key: MULTI_GRADE_MODEL.to_string(),
        weights: [0.5, 0.5],
        scaled_models: models.clone(),
        raw_models: models,
        scaler: None,
        label_encoders: CategoricalCodec::default(),
        training_info: None,
    };
    ModelRegistry::builder().with_bundle(bundle).unwrap().build()
}

fn app_with(registry: ModelRegistry) -> Router {
    let optimizer = CompositionOptimizer::new(
        GradeCatalog::builtin(),
        Arc::new(registry),
        ScoringSettings::default(),
    );
    create_app(ApiState::new(Arc::new(optimizer)))
}

fn app() -> Router {
    app_with(multi_grade_registry())
}

async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

const EN1563_REQUEST: &str = r#"{
    "grade": "EN1563",
    "composition": {"C": 3.4, "Si": 2.5, "Mn": 0.2, "P": 0.05, "S": 0.01, "Cu": 0.3, "Mg": 0.045},
    "furnace_id": "F01"
}"#;

// ============================================================================
// Service endpoints
// ============================================================================

#[tokio::test]
async fn test_get_endpoints_return_200() {
    for endpoint in ["/", "/health", "/models", "/grades/EN1563/targets"] {
        let (status, body) = get(app(), endpoint).await;
        assert_eq!(status, StatusCode::OK, "GET {endpoint}");
        assert!(body["data"].is_object(), "GET {endpoint} missing data");
        assert!(body["meta"]["timestamp"].is_string(), "GET {endpoint} missing meta");
    }
}

#[tokio::test]
async fn test_root_lists_grades_and_models() {
    let (_, body) = get(app(), "/").await;
    let grades = body["data"]["supported_grades"].as_array().unwrap();
    assert_eq!(grades.len(), 5);
    assert_eq!(body["data"]["available_models"], serde_json::json!(["MULTI_GRADE"]));
}

#[tokio::test]
async fn test_health_degraded_when_bundles_missing() {
    let (status, body) = get(app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "degraded");
    assert_eq!(body["data"]["models_loaded"], 1);

    let (_, body) = get(app_with(ModelRegistry::default()), "/health").await;
    assert_eq!(body["data"]["models_loaded"], 0);
}

#[tokio::test]
async fn test_models_reports_each_catalog_key() {
    let (_, body) = get(app(), "/models").await;
    let models = body["data"]["models"].as_array().unwrap();
    assert_eq!(models.len(), 3);
    assert_eq!(body["data"]["total_loaded"], 1);

    let multi = models.iter().find(|m| m["key"] == "MULTI_GRADE").unwrap();
    assert_eq!(multi["loaded"], true);
    assert_eq!(multi["grades"].as_array().unwrap().len(), 3);
    assert_eq!(multi["weights"], serde_json::json!([0.5, 0.5]));

    let updated = models.iter().find(|m| m["key"] == "ASTMA395_UPDATED").unwrap();
    assert_eq!(updated["loaded"], false);
}

// ============================================================================
// Grade targets
// ============================================================================

#[tokio::test]
async fn test_grade_targets_case_insensitive() {
    let (status, body) = get(app(), "/grades/astma395_updated/targets").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["grade"], "ASTMA395_UPDATED");
    assert_eq!(body["data"]["base_grade"], "ASTMA395");
    assert_eq!(body["data"]["target_specifications"]["Mn"], 0.725);
    assert_eq!(body["data"]["target_specifications"]["P"], 0.0);
}

#[tokio::test]
async fn test_grade_targets_need_no_model() {
    let (status, _) = get(app_with(ModelRegistry::default()), "/grades/EN1563/targets").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_grade_targets_is_400() {
    let (status, body) = get(app(), "/grades/XYZ/targets").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    assert!(body["error"]["message"].as_str().unwrap().contains("XYZ"));
}

// ============================================================================
// Prediction
// ============================================================================

#[tokio::test]
async fn test_predict_returns_report() {
    let (status, body) = post_json(app(), "/predict", EN1563_REQUEST).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["grade"], "EN1563");
    assert_eq!(data["element_predictions"].as_array().unwrap().len(), 7);
    assert_eq!(data["element_predictions"][0]["element"], "C");
    assert_eq!(data["cost_analysis"]["currency"], "USD");
    let recs = data["recommendations"].as_array().unwrap();
    assert_eq!(recs.len(), 1);
    assert!(recs[0].as_str().unwrap().starts_with("C: Add 0.1000%"));
}

#[tokio::test]
async fn test_predict_accepts_legacy_field_names() {
    let body = r#"{
        "alloy_grade": "ASTMA536",
        "current_composition": {"C": 3.4, "Si": 2.6, "Mn": 0.275, "P": 0.04, "S": 0.0075, "Cu": 0.35, "Mg": 0.05}
    }"#;
    let (status, body) = post_json(app(), "/predict", body).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["furnace_id"], "F01");
}

#[tokio::test]
async fn test_predict_unknown_grade_is_400() {
    let body = EN1563_REQUEST.replace("EN1563", "XYZ");
    let (status, body) = post_json(app(), "/predict", &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("Unsupported grade"));
}

#[tokio::test]
async fn test_predict_missing_element_is_400() {
    let body = r#"{"grade": "EN1563", "composition": {"C": 3.5, "Si": 2.5}}"#;
    let (status, body) = post_json(app(), "/predict", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_predict_negative_value_is_400() {
    let body = EN1563_REQUEST.replace("\"Mn\": 0.2", "\"Mn\": -0.2");
    let (status, _) = post_json(app(), "/predict", &body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_predict_malformed_json_is_400() {
    let (status, body) = post_json(app(), "/predict", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].is_string());
}

#[tokio::test]
async fn test_predict_without_bundle_is_503() {
    let body = r#"{
        "grade": "ASTMA395_UPDATED",
        "composition": {"C": 3.5, "Si": 2.9, "Mn": 0.225, "P": 0.018, "S": 0.005, "Cu": 0.2, "Mg": 0.035}
    }"#;
    let (status, body) = post_json(app(), "/predict", body).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "MODEL_UNAVAILABLE");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let resp = app()
        .oneshot(Request::builder().uri("/api/v1/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
