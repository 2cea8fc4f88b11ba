//! Disease Detection Client
//!
//! Client for the external plant-disease classification service, plus the
//! mock classifier used when no service is configured or the call fails.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Utc;
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::DetectionResult;
use std::time::Duration;

use crate::config::DetectionConfig;
use crate::error::{AppError, AppResult};

/// Which detector backs the pipeline
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DetectorBackend {
    Remote,
    Mock,
}

/// Classifies a plant image.
///
/// The bundled implementations never fail; an `Err` from a custom detector
/// is reported to subscribers as a failed scan.
#[async_trait]
pub trait DiseaseDetector: Send + Sync {
    async fn detect(&self, image: &str) -> AppResult<DetectionResult>;

    fn backend(&self) -> DetectorBackend;
}

/// Labels and confidences the mock detector picks from
const MOCK_RESULTS: [(&str, f64, bool); 5] = [
    ("Tomato___Late_blight", 0.92, false),
    ("Potato___Early_blight", 0.88, false),
    ("Apple___Cedar_apple_rust", 0.79, false),
    ("Tomato___healthy", 0.95, true),
    ("Corn_(maize)___Common_rust", 0.85, false),
];

/// Random result from a fixed table, flagged `isMock`
#[derive(Debug, Clone, Default)]
pub struct MockDiseaseDetector;

impl MockDiseaseDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn sample(&self) -> DetectionResult {
        let (disease, confidence, is_healthy) = MOCK_RESULTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(MOCK_RESULTS[0]);

        DetectionResult {
            disease: disease.to_string(),
            confidence,
            is_healthy,
            timestamp: Utc::now(),
            is_mock: true,
        }
    }
}

#[async_trait]
impl DiseaseDetector for MockDiseaseDetector {
    async fn detect(&self, _image: &str) -> AppResult<DetectionResult> {
        Ok(self.sample())
    }

    fn backend(&self) -> DetectorBackend {
        DetectorBackend::Mock
    }
}

/// Request body sent to the detection API
#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    image: &'a str,
}

/// Response from the detection API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectResponse {
    disease: String,
    confidence: f64,
    is_healthy: Option<bool>,
}

/// HTTP client for the detection API, falling back to the mock on failure
#[derive(Clone)]
pub struct HttpDiseaseDetector {
    api_url: String,
    api_key: Option<String>,
    http_client: Client,
    fallback: MockDiseaseDetector,
}

impl HttpDiseaseDetector {
    /// Create a new detection client
    pub fn new(api_url: String, api_key: Option<String>, timeout: Duration) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_url,
            api_key,
            http_client,
            fallback: MockDiseaseDetector::new(),
        })
    }

    /// Remote detector when an API URL is configured, otherwise the mock
    pub fn from_config(config: &DetectionConfig) -> AppResult<std::sync::Arc<dyn DiseaseDetector>> {
        match &config.api_url {
            Some(url) if !url.trim().is_empty() => Ok(std::sync::Arc::new(Self::new(
                url.clone(),
                config.api_key.clone(),
                Duration::from_secs(config.timeout_secs),
            )?)),
            _ => Ok(std::sync::Arc::new(MockDiseaseDetector::new())),
        }
    }

    async fn call_remote(&self, image: &str) -> AppResult<DetectionResult> {
        let payload = normalize_image(image)?;

        let mut request = self
            .http_client
            .post(&self.api_url)
            .json(&DetectRequest { image: &payload });
        if let Some(key) = &self.api_key {
            request = request.header("x-api-key", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::DetectionService(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::DetectionService(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let result: DetectResponse = response
            .json()
            .await
            .map_err(|e| AppError::DetectionService(format!("Failed to parse response: {}", e)))?;

        let is_healthy = result
            .is_healthy
            .unwrap_or_else(|| result.disease.contains("healthy"));

        Ok(DetectionResult {
            disease: result.disease,
            confidence: result.confidence.clamp(0.0, 1.0),
            is_healthy,
            timestamp: Utc::now(),
            is_mock: false,
        })
    }
}

#[async_trait]
impl DiseaseDetector for HttpDiseaseDetector {
    async fn detect(&self, image: &str) -> AppResult<DetectionResult> {
        match self.call_remote(image).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!("Disease detection failed, using mock result: {}", e);
                Ok(self.fallback.sample())
            }
        }
    }

    fn backend(&self) -> DetectorBackend {
        DetectorBackend::Remote
    }
}

/// Strip a `data:...;base64,` prefix and check the rest is valid base64
pub fn normalize_image(image: &str) -> AppResult<String> {
    let payload = match image.split_once("base64,") {
        Some((_, data)) => data,
        None => image,
    }
    .trim();

    if payload.is_empty() {
        return Err(AppError::ValidationError("image payload is empty".into()));
    }

    STANDARD
        .decode(payload)
        .map_err(|e| AppError::ValidationError(format!("image is not valid base64: {}", e)))?;

    Ok(payload.to_string())
}
