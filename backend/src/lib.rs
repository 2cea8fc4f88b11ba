//! AgriGoo farm pipeline - backend library
//!
//! Ingests farm telemetry, raises threshold and weather alerts, runs
//! periodic batch analysis per farm, and fans notifications out to
//! realtime subscribers.

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

pub use config::Config;

use error::AppResult;
use external::{DiseaseDetector, HttpDiseaseDetector};
use services::{DataProcessingService, RealtimeHub};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub processing: DataProcessingService,
    pub hub: RealtimeHub,
    pub detector: Arc<dyn DiseaseDetector>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the hub, detector and processing service from configuration
    pub fn from_config(config: Config) -> AppResult<Self> {
        let detector = HttpDiseaseDetector::from_config(&config.detection)?;
        Ok(Self::with_detector(config, detector))
    }

    /// Same as [`AppState::from_config`] with an explicit detector
    pub fn with_detector(config: Config, detector: Arc<dyn DiseaseDetector>) -> Self {
        let hub = RealtimeHub::new(config.processing.channel_capacity);
        let processing = DataProcessingService::new(
            Arc::new(hub.clone()),
            detector.clone(),
            config.processing.clone(),
        );

        Self {
            processing,
            hub,
            detector,
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .route("/ws", get(handlers::ws_handler))
        .nest("/api", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "AgriGoo Farm Pipeline API v0.1"
}
