//! Route definitions for the AgriGoo farm pipeline

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes; everything under them requires a bearer token
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Protected routes - farm data ingestion
        .nest("/data", data_routes())
        // Protected routes - detection and analytics
        .nest("/ml", ml_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Farm data routes
fn data_routes() -> Router<AppState> {
    Router::new()
        .route("/sensor", post(handlers::ingest_sensor_data))
        .route("/weather", post(handlers::ingest_weather_data))
        .route("/image-scan", post(handlers::ingest_image_scan))
        .route("/treatment-update", post(handlers::ingest_treatment_update))
        .route("/initialize-farm", post(handlers::initialize_farm))
        .route("/stop-farm", post(handlers::stop_farm))
        .route("/update-thresholds", post(handlers::update_thresholds))
        .route("/farms/:farm_id", get(handlers::get_farm_status))
}

/// Detection and analytics routes
fn ml_routes() -> Router<AppState> {
    Router::new()
        .route("/detect-disease", post(handlers::detect_disease))
        .route("/predict-spread", post(handlers::predict_disease_spread))
        .route("/analyze-soil", post(handlers::analyze_soil))
        .route("/model-status", get(handlers::model_status))
}
