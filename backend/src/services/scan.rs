//! Image scan workflow
//!
//! Runs detached from the ingesting request. Progress goes out as
//! `scan-update` events in the order 0, 30, 60, 100 (or an error event), and an
//! unhealthy result additionally raises an `outbreak-alert` with a spread
//! prediction.

use serde_json::{json, Value};
use shared::{predict_spread, DetectionResult, GeoPoint, SpreadRequest, WeatherConditions};

use crate::error::AppResult;
use crate::services::data_processing::DataProcessingService;
use crate::services::realtime::events;

/// One scan handed off by image ingestion
#[derive(Debug, Clone)]
pub(crate) struct ScanJob {
    pub farm_id: String,
    pub scan_id: String,
    pub image: String,
    pub location: Option<GeoPoint>,
}

impl DataProcessingService {
    /// Drive one scan to completion; failures end as an error event
    pub(crate) async fn run_scan(&self, job: ScanJob) {
        if let Err(e) = self.scan_stages(&job).await {
            tracing::warn!(farm_id = %job.farm_id, scan_id = %job.scan_id, "Scan failed: {}", e);
            self.sink.emit_to_farm(
                &job.farm_id,
                events::SCAN_UPDATE,
                json!({
                    "scanId": job.scan_id,
                    "status": "error",
                    "progress": 0,
                    "message": "Error analyzing image",
                    "error": e.to_string(),
                }),
            );
        }

        self.in_flight.lock().await.remove(&job.scan_id);
    }

    async fn scan_stages(&self, job: &ScanJob) -> AppResult<()> {
        self.scan_progress(job, 30, "Analyzing image patterns");
        tokio::time::sleep(self.settings.scan_stage_delay()).await;
        self.scan_progress(job, 60, "Running disease detection model");

        let result = self.detector.detect(&job.image).await?;

        self.sink.emit_to_farm(
            &job.farm_id,
            events::SCAN_UPDATE,
            json!({
                "scanId": job.scan_id,
                "status": "completed",
                "progress": 100,
                "message": "Analysis complete",
                "result": result,
            }),
        );
        tracing::info!(
            farm_id = %job.farm_id,
            scan_id = %job.scan_id,
            disease = %result.disease,
            healthy = result.is_healthy,
            "Scan completed"
        );

        if !result.is_healthy {
            self.raise_outbreak(job, &result).await;
        }

        self.attach_result(job, result).await;
        Ok(())
    }

    fn scan_progress(&self, job: &ScanJob, progress: u8, message: &str) {
        self.sink.emit_to_farm(
            &job.farm_id,
            events::SCAN_UPDATE,
            json!({
                "scanId": job.scan_id,
                "status": "processing",
                "progress": progress,
                "message": message,
            }),
        );
    }

    /// Spread prediction from the farm's latest weather, sent to the farm
    /// and, when configured, its region
    async fn raise_outbreak(&self, job: &ScanJob, result: &DetectionResult) {
        let (weather, region) = {
            let streams = self.streams.read().await;
            match streams.get(&job.farm_id) {
                Some(stream) => (
                    stream.latest_weather().map(WeatherConditions::from),
                    stream.config.region.clone(),
                ),
                None => (None, None),
            }
        };

        let location = job.location.unwrap_or_default();
        let prediction = predict_spread(&SpreadRequest {
            disease: result.disease.clone(),
            location,
            weather_data: weather.unwrap_or_default(),
        });

        let payload: Value = json!({
            "farmId": job.farm_id,
            "disease": result.disease,
            "confidence": result.confidence,
            "location": location,
            "prediction": prediction,
            "scanId": job.scan_id,
        });

        if let Some(region) = &region {
            self.sink
                .emit_to_region(region, events::OUTBREAK_ALERT, payload.clone());
        }
        self.sink
            .emit_to_farm(&job.farm_id, events::OUTBREAK_ALERT, payload);

        tracing::warn!(
            farm_id = %job.farm_id,
            disease = %result.disease,
            risk = ?prediction.risk_level,
            "Disease outbreak detected"
        );
    }

    /// Store the result on the matching scan; a no-op if the farm was stopped
    /// or the scan evicted meanwhile
    async fn attach_result(&self, job: &ScanJob, result: DetectionResult) {
        let mut streams = self.streams.write().await;
        let scan = streams
            .get_mut(&job.farm_id)
            .and_then(|stream| stream.image_data.iter_mut().find(|s| s.scan_id == job.scan_id));

        if let Some(scan) = scan {
            scan.result = Some(result);
            scan.processed = true;
        }
    }
}
