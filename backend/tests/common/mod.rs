//! Shared fixtures for the backend integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::{Arc, Mutex};

use agrigoo_backend::config::ProcessingConfig;
use agrigoo_backend::error::{AppError, AppResult};
use agrigoo_backend::external::{DetectorBackend, DiseaseDetector};
use agrigoo_backend::services::{DataProcessingService, NotificationSink};
use shared::DetectionResult;

/// One captured emission
#[derive(Debug, Clone)]
pub struct Emitted {
    pub room: String,
    pub event: String,
    pub payload: Value,
}

/// Sink that records every emission in order
#[derive(Default)]
pub struct RecordingSink {
    emitted: Mutex<Vec<Emitted>>,
}

impl RecordingSink {
    pub fn all(&self) -> Vec<Emitted> {
        self.emitted.lock().unwrap().clone()
    }

    pub fn events(&self, room: &str, event: &str) -> Vec<Value> {
        self.all()
            .into_iter()
            .filter(|e| e.room == room && e.event == event)
            .map(|e| e.payload)
            .collect()
    }

    pub fn clear(&self) {
        self.emitted.lock().unwrap().clear();
    }
}

impl NotificationSink for RecordingSink {
    fn emit_to_room(&self, room: &str, event: &str, payload: Value) {
        self.emitted.lock().unwrap().push(Emitted {
            room: room.to_string(),
            event: event.to_string(),
            payload,
        });
    }
}

/// Detector that always returns the same label
pub struct FixedDetector {
    pub disease: &'static str,
    pub confidence: f64,
    pub is_healthy: bool,
}

impl FixedDetector {
    pub fn diseased(disease: &'static str) -> Self {
        Self {
            disease,
            confidence: 0.9,
            is_healthy: false,
        }
    }

    pub fn healthy() -> Self {
        Self {
            disease: "Tomato___healthy",
            confidence: 0.97,
            is_healthy: true,
        }
    }
}

#[async_trait]
impl DiseaseDetector for FixedDetector {
    async fn detect(&self, _image: &str) -> AppResult<DetectionResult> {
        Ok(DetectionResult {
            disease: self.disease.to_string(),
            confidence: self.confidence,
            is_healthy: self.is_healthy,
            timestamp: Utc::now(),
            is_mock: false,
        })
    }

    fn backend(&self) -> DetectorBackend {
        DetectorBackend::Remote
    }
}

/// Detector whose calls always fail
pub struct FailingDetector;

#[async_trait]
impl DiseaseDetector for FailingDetector {
    async fn detect(&self, _image: &str) -> AppResult<DetectionResult> {
        Err(AppError::DetectionService("model unavailable".into()))
    }

    fn backend(&self) -> DetectorBackend {
        DetectorBackend::Remote
    }
}

pub fn test_settings() -> ProcessingConfig {
    ProcessingConfig {
        default_interval_ms: 60_000,
        retention_hours: 24,
        scan_stage_delay_ms: 10,
        channel_capacity: 64,
    }
}

pub fn service_with(
    detector: Arc<dyn DiseaseDetector>,
) -> (DataProcessingService, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let service = DataProcessingService::new(sink.clone(), detector, test_settings());
    (service, sink)
}

pub fn service() -> (DataProcessingService, Arc<RecordingSink>) {
    service_with(Arc::new(FixedDetector::healthy()))
}

/// Wait until no scans are in flight
pub async fn drain_scans(service: &DataProcessingService) {
    for _ in 0..500 {
        if service.in_flight_scans().await == 0 {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    panic!("scans did not finish");
}
