//! HTTP handlers for farm data ingestion endpoints

use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{Map, Value};
use shared::{FarmConfigInput, GeoPoint, SensorInput, ThresholdOverlay, WeatherInput};
use validator::Validate;

use crate::error::AppResult;
use crate::handlers::{ApiJson, ApiResponse};
use crate::middleware::CurrentUser;
use crate::services::{
    FarmInitialized, FarmStatus, FarmStopped, ImageSubmission, IngestReceipt, ScanAccepted,
    ThresholdsUpdated, TreatmentAccepted,
};
use crate::AppState;

/// Sensor reading submission
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SensorDataRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "farmId is required"))]
    pub farm_id: String,
    #[validate(required(message = "data is required"))]
    pub data: Option<SensorInput>,
}

/// Ingest a sensor reading
pub async fn ingest_sensor_data(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(input): ApiJson<SensorDataRequest>,
) -> AppResult<ApiResponse<IngestReceipt>> {
    input.validate()?;
    tracing::debug!(user = %current_user.0.user_id, farm_id = %input.farm_id, "Sensor data received");

    let receipt = state
        .processing
        .ingest_sensor(&input.farm_id, input.data.unwrap_or_default())
        .await?;
    Ok(ApiResponse::ok(receipt))
}

/// Weather reading submission
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WeatherDataRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "farmId is required"))]
    pub farm_id: String,
    #[validate(required(message = "data is required"))]
    pub data: Option<WeatherInput>,
}

/// Ingest a weather reading
pub async fn ingest_weather_data(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(input): ApiJson<WeatherDataRequest>,
) -> AppResult<ApiResponse<IngestReceipt>> {
    input.validate()?;
    tracing::debug!(user = %current_user.0.user_id, farm_id = %input.farm_id, "Weather data received");

    let receipt = state
        .processing
        .ingest_weather(&input.farm_id, input.data.unwrap_or_default())
        .await?;
    Ok(ApiResponse::ok(receipt))
}

/// Image scan submission
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImageScanRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "farmId is required"))]
    pub farm_id: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "image is required"))]
    pub image: String,
    pub location: Option<GeoPoint>,
    pub metadata: Option<Value>,
}

/// Start an image scan; returns before the scan finishes
pub async fn ingest_image_scan(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(input): ApiJson<ImageScanRequest>,
) -> AppResult<ApiResponse<ScanAccepted>> {
    input.validate()?;
    tracing::debug!(user = %current_user.0.user_id, farm_id = %input.farm_id, "Image scan received");

    let accepted = state
        .processing
        .ingest_image(
            &input.farm_id,
            ImageSubmission {
                image: input.image,
                location: input.location,
                metadata: input.metadata,
            },
        )
        .await?;
    Ok(ApiResponse::ok(accepted))
}

/// Treatment progress submission
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentUpdateRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "farmId is required"))]
    pub farm_id: String,
    #[validate(required(message = "treatmentData is required"))]
    pub treatment_data: Option<Map<String, Value>>,
}

/// Relay a treatment update to farm subscribers
pub async fn ingest_treatment_update(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(input): ApiJson<TreatmentUpdateRequest>,
) -> AppResult<ApiResponse<TreatmentAccepted>> {
    input.validate()?;
    tracing::debug!(user = %current_user.0.user_id, farm_id = %input.farm_id, "Treatment update received");

    let accepted = state
        .processing
        .ingest_treatment_update(&input.farm_id, input.treatment_data.unwrap_or_default())
        .await?;
    Ok(ApiResponse::ok(accepted))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InitializeFarmRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "farmId is required"))]
    pub farm_id: String,
    pub config: Option<FarmConfigInput>,
}

/// Start processing for a farm
pub async fn initialize_farm(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(input): ApiJson<InitializeFarmRequest>,
) -> AppResult<ApiResponse<FarmInitialized>> {
    input.validate()?;
    tracing::info!(user = %current_user.0.user_id, farm_id = %input.farm_id, "Initialize farm requested");

    let initialized = state
        .processing
        .initialize_farm(&input.farm_id, input.config)
        .await?;
    Ok(ApiResponse::ok(initialized))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StopFarmRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "farmId is required"))]
    pub farm_id: String,
}

/// Stop processing for a farm; stopping an unknown farm succeeds
pub async fn stop_farm(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(input): ApiJson<StopFarmRequest>,
) -> AppResult<ApiResponse<FarmStopped>> {
    input.validate()?;
    tracing::info!(user = %current_user.0.user_id, farm_id = %input.farm_id, "Stop farm requested");

    Ok(ApiResponse::ok(state.processing.stop_farm(&input.farm_id).await))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateThresholdsRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "farmId is required"))]
    pub farm_id: String,
    #[validate(required(message = "thresholds is required"))]
    pub thresholds: Option<ThresholdOverlay>,
}

/// Merge threshold overrides into a farm's bands
pub async fn update_thresholds(
    State(state): State<AppState>,
    current_user: CurrentUser,
    ApiJson(input): ApiJson<UpdateThresholdsRequest>,
) -> AppResult<ApiResponse<ThresholdsUpdated>> {
    input.validate()?;
    tracing::info!(user = %current_user.0.user_id, farm_id = %input.farm_id, "Threshold update requested");

    let updated = state
        .processing
        .update_thresholds(&input.farm_id, input.thresholds.unwrap_or_default())
        .await?;
    Ok(ApiResponse::ok(updated))
}

/// Get the status of a farm stream
pub async fn get_farm_status(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(farm_id): Path<String>,
) -> AppResult<ApiResponse<FarmStatus>> {
    let status = state.processing.farm_status(&farm_id).await?;
    Ok(ApiResponse::ok(status))
}
