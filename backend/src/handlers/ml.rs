//! HTTP handlers for disease detection and crop analytics

use axum::extract::State;
use serde::{Deserialize, Serialize};
use shared::{
    analyze_soil_health, predict_spread, DetectionResult, GeoPoint, SoilHealthAnalysis,
    SoilSample, SpreadPrediction, SpreadRequest, WeatherConditions,
};
use validator::Validate;

use crate::error::AppResult;
use crate::external::{disease_detection::normalize_image, DetectorBackend};
use crate::handlers::{ApiJson, ApiResponse};
use crate::middleware::CurrentUser;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct DetectDiseaseRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "image is required"))]
    pub image: String,
}

/// Classify an image directly, without touching farm state
pub async fn detect_disease(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(input): ApiJson<DetectDiseaseRequest>,
) -> AppResult<ApiResponse<DetectionResult>> {
    input.validate()?;
    let image = normalize_image(&input.image)?;
    tracing::debug!(user = %current_user.0.user_id, "Direct disease detection requested");

    let result = state.detector.detect(&image).await?;
    Ok(ApiResponse::ok(result))
}

/// Weather fields for spread prediction; missing ones use the defaults
#[derive(Debug, Default, Deserialize)]
pub struct WeatherDataInput {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub rainfall: Option<f64>,
}

impl From<WeatherDataInput> for WeatherConditions {
    fn from(input: WeatherDataInput) -> Self {
        let defaults = WeatherConditions::default();
        WeatherConditions {
            temperature: input.temperature.unwrap_or(defaults.temperature),
            humidity: input.humidity.unwrap_or(defaults.humidity),
            rainfall: input.rainfall.unwrap_or(defaults.rainfall),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PredictSpreadRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "disease is required"))]
    pub disease: String,
    pub location: Option<GeoPoint>,
    pub weather_data: Option<WeatherDataInput>,
}

pub async fn predict_disease_spread(
    _current_user: CurrentUser,
    ApiJson(input): ApiJson<PredictSpreadRequest>,
) -> AppResult<ApiResponse<SpreadPrediction>> {
    input.validate()?;

    let prediction = predict_spread(&SpreadRequest {
        disease: input.disease,
        location: input.location.unwrap_or_default(),
        weather_data: input.weather_data.unwrap_or_default().into(),
    });
    Ok(ApiResponse::ok(prediction))
}

pub async fn analyze_soil(
    _current_user: CurrentUser,
    ApiJson(sample): ApiJson<SoilSample>,
) -> AppResult<ApiResponse<SoilHealthAnalysis>> {
    Ok(ApiResponse::ok(analyze_soil_health(&sample)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatus {
    pub backend: DetectorBackend,
    pub in_flight_scans: usize,
}

/// Report which detector backend is active
pub async fn model_status(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<ApiResponse<ModelStatus>> {
    Ok(ApiResponse::ok(ModelStatus {
        backend: state.detector.backend(),
        in_flight_scans: state.processing.in_flight_scans().await,
    }))
}
