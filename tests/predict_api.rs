//! End-to-end router tests against the fixture bundle and fake models.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use copd_risk::config::Config;
use copd_risk::engine::{load_bundle, FeatureRow, ModelError, RiskModel};
use copd_risk::features::{DEFAULT_FEATURE_ORDER, FIELD_MAP};
use copd_risk::state::ModelInfo;
use copd_risk::{create_router, AppState};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/copd_risk_model.json")
}

fn fixture_state() -> AppState {
    let bundle = load_bundle(&fixture_path()).unwrap();
    AppState::from_bundle(Config::default(), bundle)
}

/// Identity preprocessing and a constant probability.
struct ConstantModel {
    features: Vec<String>,
    probability: f64,
    delay: Duration,
    panics: bool,
}

impl ConstantModel {
    fn new(probability: f64) -> Self {
        Self {
            features: DEFAULT_FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
            probability,
            delay: Duration::ZERO,
            panics: false,
        }
    }
}

impl RiskModel for ConstantModel {
    fn feature_order(&self) -> &[String] {
        &self.features
    }

    fn impute(&self, row: &FeatureRow) -> Result<FeatureRow, ModelError> {
        Ok(row.mapv(|v| if v.is_nan() { 0.0 } else { v }))
    }

    fn scale(&self, row: &FeatureRow) -> Result<FeatureRow, ModelError> {
        Ok(row.clone())
    }

    fn predict_probability(&self, _row: &FeatureRow) -> Result<f64, ModelError> {
        std::thread::sleep(self.delay);
        if self.panics {
            panic!("classifier blew up");
        }
        Ok(self.probability)
    }
}

fn fake_state(model: ConstantModel, config: Config) -> AppState {
    let info = ModelInfo {
        source: "fake".to_string(),
        checksum: None,
        loaded_at: None,
    };
    AppState::new(config, Arc::new(model), info)
}

fn post_predict(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn sample_payload() -> Value {
    json!({
        "age": 55, "bmi": 26, "mmrc": 2, "packYears": 20, "exacerbations": 1,
        "occupationalExposure": 0, "fev1Fvc": 0.65, "fev1": 70, "oxygen": 92,
        "eosinophil": 150, "dlco": 65, "aat": 120
    })
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, req).await
}

#[tokio::test]
async fn test_fixture_regression() {
    let app = create_router(fixture_state());
    let (status, body) = send(app, post_predict(sample_payload().to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "risk_score": 67.7, "result": "Moderate Risk"}));
}

#[tokio::test]
async fn test_empty_object_uses_imputer_for_every_field() {
    let (status, body) = send(create_router(fixture_state()), post_predict("{}")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["risk_score"], 22.3);
    assert_eq!(body["result"], "Low Risk");
}

#[tokio::test]
async fn test_single_null_field_does_not_crash() {
    let (status, body) = send(
        create_router(fixture_state()),
        post_predict(r#"{"age": 70, "oxygen": null, "fev1Fvc": 0.5}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn test_every_field_can_be_null_or_omitted() {
    let state = fixture_state();

    for (key, _) in FIELD_MAP {
        let mut nulled = sample_payload();
        nulled[key] = Value::Null;
        let mut omitted = sample_payload();
        omitted.as_object_mut().unwrap().remove(key);

        for payload in [nulled, omitted] {
            let app = create_router(state.clone());
            let (status, body) = send(app, post_predict(payload.to_string())).await;
            assert_eq!(status, StatusCode::OK, "field {}: {}", key, body);
            assert_eq!(body["status"], "success", "field {}", key);
            let score = body["risk_score"].as_f64().unwrap();
            assert!((0.0..=100.0).contains(&score), "field {}", key);
        }
    }

    let (_, body) = get_json(create_router(state), "/api/v1/model").await;
    assert_eq!(body["inference_count"], 2 * FIELD_MAP.len());
    assert_eq!(body["failure_count"], 0);
}

#[tokio::test]
async fn test_malformed_json_is_500_with_message() {
    let app = create_router(fixture_state());
    let (status, body) = send(app, post_predict("{\"age\": ")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");
    assert!(!body["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_object_body_is_500() {
    let app = create_router(fixture_state());
    let (status, body) = send(app, post_predict("[1, 2, 3]")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "request body must be a JSON object");
}

#[tokio::test]
async fn test_wrong_typed_field_is_500() {
    let app = create_router(fixture_state());
    let (status, body) = send(app, post_predict(r#"{"bmi": "heavy"}"#)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("could not convert string to float"));
    assert!(message.contains("bmi"));
}

#[tokio::test]
async fn test_body_parsed_without_json_content_type() {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("{}"))
        .unwrap();

    let (status, body) = send(create_router(fixture_state()), req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Low Risk");
}

#[tokio::test]
async fn test_only_post_is_routed() {
    let req = Request::builder()
        .method(Method::GET)
        .uri("/predict")
        .body(Body::empty())
        .unwrap();

    let resp = create_router(fixture_state()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/predict")
        .header(header::ORIGIN, "http://clinic.example")
        .body(Body::from("{}"))
        .unwrap();

    let resp = create_router(fixture_state()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "*"
    );
}

#[tokio::test]
async fn test_threshold_boundaries_through_http() {
    let cases = [
        (0.70, 70.0, "Moderate Risk"),
        (0.30, 30.0, "Low Risk"),
        (0.71, 71.0, "High Risk"),
        (0.0, 0.0, "Low Risk"),
        (1.0, 100.0, "High Risk"),
    ];

    for (p, score, label) in cases {
        let app = create_router(fake_state(ConstantModel::new(p), Config::default()));
        let (status, body) = send(app, post_predict("{}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["risk_score"], score, "p = {}", p);
        assert_eq!(body["result"], label, "p = {}", p);
    }
}

#[tokio::test]
async fn test_degraded_state() {
    let reason = "cannot read model bundle copd_risk_model.json";
    let state = AppState::degraded(Config::default(), reason);

    let (status, body) = send(create_router(state.clone()), post_predict("{}")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().unwrap().starts_with("model not loaded"));

    let (status, body) = get_json(create_router(state), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["model_loaded"], false);
}

#[tokio::test]
async fn test_timeout_bounds_inference() {
    let mut model = ConstantModel::new(0.5);
    model.delay = Duration::from_millis(500);
    let config = Config {
        predict_timeout: Some(Duration::from_millis(20)),
        ..Config::default()
    };

    let app = create_router(fake_state(model, config));
    let (status, body) = send(app, post_predict("{}")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], "prediction timed out after 20 ms");
}

#[tokio::test]
async fn test_panicking_model_is_500_and_counted_as_failure() {
    let mut model = ConstantModel::new(0.5);
    model.panics = true;
    let state = fake_state(model, Config::default());

    let (status, body) = send(create_router(state.clone()), post_predict("{}")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["status"], "error");

    let (status, body) = get_json(create_router(state), "/api/v1/model").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["inference_count"], 1);
    assert_eq!(body["failure_count"], 1);
}

#[tokio::test]
async fn test_model_status_reports_counters() {
    let state = fixture_state();
    send(create_router(state.clone()), post_predict("{}")).await;
    send(create_router(state.clone()), post_predict(r#"{"age": "x"}"#)).await;

    let (status, body) = get_json(create_router(state), "/api/v1/model").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["classifier"], "logistic_regression (standard scaler)");
    assert_eq!(body["features"].as_array().unwrap().len(), 12);
    assert_eq!(body["checksum"].as_str().unwrap().len(), 64);
    assert_eq!(body["inference_count"], 2);
    assert_eq!(body["failure_count"], 1);
}
