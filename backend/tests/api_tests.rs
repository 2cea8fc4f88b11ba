//! HTTP API tests for the AgriGoo farm pipeline
//!
//! Drives the full router with `tower::ServiceExt::oneshot`, covering
//! authentication, the response envelopes and the ML endpoints.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use agrigoo_backend::{create_app, middleware::Claims, AppState, Config};
use common::{test_settings, FixedDetector};

fn app() -> Router {
    let mut config = Config::default();
    config.processing = test_settings();
    let state = AppState::with_detector(config, Arc::new(FixedDetector::healthy()));
    create_app(state)
}

fn bearer() -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: "grower-1".to_string(),
        exp: now + 3_600,
        iat: now,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(Config::default().jwt.secret.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::AUTHORIZATION, bearer())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, bearer())
        .body(Body::empty())
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

// ============================================================================
// Authentication
// ============================================================================

#[cfg(test)]
mod auth_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_rejected() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/data/sensor")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({"farmId": "farm-1", "data": {}}).to_string()))
            .unwrap();

        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_forged_token_rejected() {
        let request = Request::builder()
            .uri("/api/ml/model-status")
            .header(header::AUTHORIZATION, "Bearer not.a.token")
            .body(Body::empty())
            .unwrap();

        let (status, _) = send(app(), request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["activeFarms"], 0);
    }
}

// ============================================================================
// Data endpoints
// ============================================================================

#[cfg(test)]
mod data_tests {
    use super::*;

    #[tokio::test]
    async fn test_sensor_success_envelope() {
        let (status, body) = send(
            app(),
            post(
                "/api/data/sensor",
                json!({"farmId": "farm-1", "data": {"temperature": 21.5, "humidity": 55}}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["status"], "received");
        assert!(body["data"]["dataId"].is_string());
    }

    #[tokio::test]
    async fn test_missing_farm_id_is_validation_error() {
        let (status, body) = send(
            app(),
            post("/api/data/weather", json!({"data": {"temperature": 20}})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["error"].as_str().unwrap().contains("farmId is required"));
    }

    #[tokio::test]
    async fn test_malformed_json_uses_error_envelope() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/data/sensor")
            .header(header::AUTHORIZATION, bearer())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_farm_lifecycle_over_http() {
        let app = app();

        let (status, body) = send(
            app.clone(),
            post(
                "/api/data/initialize-farm",
                json!({"farmId": "farm-7", "config": {"processingInterval": 30000, "region": "coast"}}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "initialized");
        assert_eq!(body["data"]["config"]["processingInterval"], 30000);

        let (status, body) = send(app.clone(), get("/api/data/farms/farm-7")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["config"]["region"], "coast");
        assert_eq!(body["data"]["timerActive"], true);

        let (status, body) = send(
            app.clone(),
            post("/api/data/stop-farm", json!({"farmId": "farm-7"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "stopped");

        let (status, body) = send(app, get("/api/data/farms/farm-7")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_update_thresholds_returns_merged_set() {
        let (status, body) = send(
            app(),
            post(
                "/api/data/update-thresholds",
                json!({"farmId": "farm-1", "thresholds": {"humidity": {"min": 40, "max": 70}}}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "updated");
        assert_eq!(body["data"]["thresholds"]["humidity"]["min"], 40.0);
        assert_eq!(body["data"]["thresholds"]["temperature"]["max"], 35.0);
    }

    #[tokio::test]
    async fn test_inverted_threshold_names_wire_field() {
        let (status, body) = send(
            app(),
            post(
                "/api/data/update-thresholds",
                json!({"farmId": "farm-1", "thresholds": {"soilMoisture": {"min": 70, "max": 20}}}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["field"], "soilMoisture");
    }

    #[tokio::test]
    async fn test_treatment_update_requires_status() {
        let (status, body) = send(
            app(),
            post(
                "/api/data/treatment-update",
                json!({"farmId": "farm-1", "treatmentData": {"treatmentId": "t-1"}}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "status");
    }

    #[tokio::test]
    async fn test_image_scan_accepted() {
        let (status, body) = send(
            app(),
            post(
                "/api/data/image-scan",
                json!({"farmId": "farm-1", "image": "aGVsbG8=", "location": {"lat": 0.5, "lng": 37.1}}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "processing");
        assert!(body["data"]["scanId"].as_str().unwrap().starts_with("scan-"));
    }
}

// ============================================================================
// ML endpoints
// ============================================================================

#[cfg(test)]
mod ml_tests {
    use super::*;

    #[tokio::test]
    async fn test_predict_spread_defaults_missing_weather() {
        let (status, body) = send(
            app(),
            post(
                "/api/ml/predict-spread",
                json!({"disease": "Potato___Late_blight", "weatherData": {"humidity": 90}}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        // 90 * 0.6 + 25 * 0.3 + 0 * 0.1
        let factor = body["data"]["spreadFactor"].as_f64().unwrap();
        assert!((factor - 61.5).abs() < 1e-9);
        assert_eq!(body["data"]["riskLevel"], "High");
        assert_eq!(body["data"]["affectedArea"]["affectedFarms"], 11);
    }

    #[tokio::test]
    async fn test_predict_spread_requires_disease() {
        let (status, _) = send(app(), post("/api/ml/predict-spread", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analyze_soil() {
        let (status, body) = send(
            app(),
            post(
                "/api/ml/analyze-soil",
                json!({"pH": 5.0, "nitrogen": 10, "phosphorus": 40, "potassium": 40}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let deficiencies = body["data"]["deficiencies"].as_array().unwrap();
        assert!(deficiencies.contains(&json!("Nitrogen")));
        assert!(deficiencies.contains(&json!("pH (too acidic)")));
    }

    #[tokio::test]
    async fn test_detect_disease_rejects_bad_base64() {
        let (status, _) = send(
            app(),
            post("/api/ml/detect-disease", json!({"image": "%%%not-base64%%%"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_detect_disease_strips_data_url() {
        let (status, body) = send(
            app(),
            post(
                "/api/ml/detect-disease",
                json!({"image": "data:image/jpeg;base64,aGVsbG8="}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["disease"], "Tomato___healthy");
        // Real detections omit the mock flag
        assert!(body["data"].get("isMock").is_none());
    }

    #[tokio::test]
    async fn test_model_status_reports_backend() {
        let (status, body) = send(app(), get("/api/ml/model-status")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["backend"], "remote");
    }
}
