//! Farm data processing service
//!
//! Owns the per-farm reading buffers, evaluates readings as they arrive,
//! and runs a periodic batch analysis for every active farm.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::Rng;
use serde::Serialize;
use serde_json::{json, Map, Value};
use shared::{
    analyze_soil_health, analyze_weather_trends, check_extreme_weather, check_sensor_reading,
    validate_farm_id, validate_threshold_overlay, validate_treatment_update, Alert, FarmConfig,
    FarmConfigInput, GeoPoint, ImageScan, SensorInput, SensorReading, SoilHealthAnalysis,
    ThresholdOverlay, ThresholdSet, WeatherInput, WeatherReading,
};
use std::collections::{hash_map::Entry, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use validator::Validate;

use crate::config::ProcessingConfig;
use crate::error::{AppError, AppResult};
use crate::external::DiseaseDetector;
use crate::services::realtime::{events, NotificationSink};
use crate::services::scan::ScanJob;

/// Buffered state of one farm
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmStream {
    pub farm_id: String,
    pub sensor_data: Vec<SensorReading>,
    pub weather_data: Vec<WeatherReading>,
    pub image_data: Vec<ImageScan>,
    pub last_processed: DateTime<Utc>,
    pub config: FarmConfig,
    /// Set the first time thresholds are updated for this farm
    pub thresholds: Option<ThresholdSet>,
}

/// What one batch run did to a stream
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    pub sensor_processed: usize,
    pub weather_processed: usize,
    pub soil_health: Option<SoilHealthAnalysis>,
    pub trend_alerts: Vec<Alert>,
    pub evicted: usize,
}

impl FarmStream {
    pub fn new(farm_id: impl Into<String>, config: FarmConfig, now: DateTime<Utc>) -> Self {
        Self {
            farm_id: farm_id.into(),
            sensor_data: Vec::new(),
            weather_data: Vec::new(),
            image_data: Vec::new(),
            last_processed: now,
            config,
            thresholds: None,
        }
    }

    /// Farm bands when set, otherwise the defaults
    pub fn effective_thresholds(&self) -> ThresholdSet {
        self.thresholds.unwrap_or_default()
    }

    /// Merge `overlay` onto the farm bands (or a copy of the defaults)
    pub fn apply_overlay(&mut self, overlay: &ThresholdOverlay) -> ThresholdSet {
        let merged = self.effective_thresholds().merged(overlay);
        self.thresholds = Some(merged);
        merged
    }

    /// Analyse unprocessed readings, mark them processed, then evict
    /// everything older than `now - retention`.
    pub fn run_batch(&mut self, now: DateTime<Utc>, retention: ChronoDuration) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        let new_weather: Vec<WeatherReading> = self
            .weather_data
            .iter()
            .filter(|r| !r.processed)
            .cloned()
            .collect();
        let latest_sensor = self
            .sensor_data
            .iter()
            .filter(|r| !r.processed)
            .max_by_key(|r| r.timestamp);

        outcome.sensor_processed = self.sensor_data.iter().filter(|r| !r.processed).count();
        outcome.weather_processed = new_weather.len();

        if outcome.sensor_processed > 0 || outcome.weather_processed > 0 {
            outcome.soil_health = latest_sensor
                .and_then(SensorReading::soil_sample)
                .map(|sample| analyze_soil_health(&sample));
            outcome.trend_alerts = analyze_weather_trends(&new_weather);

            self.sensor_data.iter_mut().for_each(|r| r.processed = true);
            self.weather_data.iter_mut().for_each(|r| r.processed = true);
            self.last_processed = now;
        }

        outcome.evicted = self.evict_before(now - retention);
        outcome
    }

    /// Drop readings timestamped before `cutoff`; returns how many went
    pub fn evict_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.sensor_data.len() + self.weather_data.len() + self.image_data.len();

        self.sensor_data.retain(|r| r.timestamp >= cutoff);
        self.weather_data.retain(|r| r.timestamp >= cutoff);
        self.image_data.retain(|s| s.timestamp >= cutoff);

        before - (self.sensor_data.len() + self.weather_data.len() + self.image_data.len())
    }

    /// Latest weather reading by timestamp
    pub fn latest_weather(&self) -> Option<&WeatherReading> {
        self.weather_data.iter().max_by_key(|r| r.timestamp)
    }
}

/// Response of farm initialisation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmInitialized {
    pub farm_id: String,
    /// `initialized` for a new stream, `active` when one already existed
    pub status: &'static str,
    pub config: FarmConfig,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FarmStopped {
    pub farm_id: String,
    pub status: &'static str,
}

/// Acknowledgement of a buffered reading
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReceipt {
    pub status: &'static str,
    pub data_id: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanAccepted {
    pub status: &'static str,
    pub scan_id: String,
    pub message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentAccepted {
    pub status: &'static str,
    pub treatment_id: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdsUpdated {
    pub farm_id: String,
    pub status: &'static str,
    pub thresholds: ThresholdSet,
}

/// Image submitted for a scan
#[derive(Debug, Clone, Default)]
pub struct ImageSubmission {
    pub image: String,
    pub location: Option<GeoPoint>,
    pub metadata: Option<Value>,
}

/// Point-in-time view of a farm stream
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmStatus {
    pub farm_id: String,
    pub sensor_readings: usize,
    pub weather_readings: usize,
    pub image_scans: usize,
    pub unprocessed_sensor: usize,
    pub unprocessed_weather: usize,
    pub pending_scans: usize,
    pub last_processed: DateTime<Utc>,
    pub config: FarmConfig,
    pub thresholds: ThresholdSet,
    pub timer_active: bool,
}

/// Farm data processing service
#[derive(Clone)]
pub struct DataProcessingService {
    pub(super) streams: Arc<RwLock<HashMap<String, FarmStream>>>,
    timers: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
    pub(super) in_flight: Arc<Mutex<HashSet<String>>>,
    pub(super) sink: Arc<dyn NotificationSink>,
    pub(super) detector: Arc<dyn DiseaseDetector>,
    pub(super) settings: ProcessingConfig,
}

impl DataProcessingService {
    /// Create a new data processing service
    pub fn new(
        sink: Arc<dyn NotificationSink>,
        detector: Arc<dyn DiseaseDetector>,
        settings: ProcessingConfig,
    ) -> Self {
        Self {
            streams: Arc::new(RwLock::new(HashMap::new())),
            timers: Arc::new(Mutex::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            sink,
            detector,
            settings,
        }
    }

    pub fn detector(&self) -> &Arc<dyn DiseaseDetector> {
        &self.detector
    }

    fn default_farm_config(&self) -> FarmConfig {
        FarmConfig {
            processing_interval: self.settings.default_interval_ms,
            ..FarmConfig::default()
        }
    }

    /// Run `f` on the farm's stream, creating it (and its timer) first if needed.
    /// The bool passed to `f` is true when the stream was just created.
    async fn with_stream<R>(
        &self,
        farm_id: &str,
        config: impl FnOnce() -> FarmConfig,
        f: impl FnOnce(&mut FarmStream, bool) -> R,
    ) -> R {
        let mut streams = self.streams.write().await;

        match streams.entry(farm_id.to_string()) {
            Entry::Occupied(entry) => f(entry.into_mut(), false),
            Entry::Vacant(entry) => {
                let config = config();
                let period = Duration::from_millis(config.processing_interval.max(1));

                // Lock order is streams, then timers
                let mut timers = self.timers.lock().await;
                let handle = self.spawn_timer(farm_id, period);
                if let Some(stale) = timers.insert(farm_id.to_string(), handle) {
                    stale.abort();
                }
                drop(timers);

                tracing::info!(
                    farm_id,
                    interval_ms = config.processing_interval,
                    "Initialized data processing for farm"
                );
                f(entry.insert(FarmStream::new(farm_id, config, Utc::now())), true)
            }
        }
    }

    fn spawn_timer(&self, farm_id: &str, period: Duration) -> JoinHandle<()> {
        let service = self.clone();
        let farm_id = farm_id.to_string();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if service.process_batch(&farm_id).await.is_none() {
                    tracing::debug!(farm_id = %farm_id, "Farm stream gone, timer exiting");
                    break;
                }
            }
        })
    }

    /// Create the farm stream if absent; an existing stream keeps its config
    pub async fn initialize_farm(
        &self,
        farm_id: &str,
        input: Option<FarmConfigInput>,
    ) -> AppResult<FarmInitialized> {
        validate_farm_id(farm_id)?;
        let input = input.unwrap_or_default();
        input.validate()?;

        let defaults = self.default_farm_config();
        let (config, created) = self
            .with_stream(
                farm_id,
                || defaults.with_overrides(&input),
                |stream, created| (stream.config.clone(), created),
            )
            .await;

        Ok(FarmInitialized {
            farm_id: farm_id.to_string(),
            status: if created { "initialized" } else { "active" },
            config,
        })
    }

    /// Cancel the farm's timer and drop its stream; a no-op for unknown farms
    pub async fn stop_farm(&self, farm_id: &str) -> FarmStopped {
        // Lock order is streams, then timers
        let mut streams = self.streams.write().await;
        let removed = streams.remove(farm_id);
        if let Some(handle) = self.timers.lock().await.remove(farm_id) {
            handle.abort();
        }
        drop(streams);

        if removed.is_some() {
            tracing::info!(farm_id, "Stopped data processing for farm");
        }

        FarmStopped {
            farm_id: farm_id.to_string(),
            status: "stopped",
        }
    }

    pub async fn ingest_sensor(&self, farm_id: &str, input: SensorInput) -> AppResult<IngestReceipt> {
        validate_farm_id(farm_id)?;
        let reading = SensorReading::from_input(input, Utc::now());
        let data_id = reading.timestamp;

        let (alerts, alerting_enabled) = self
            .with_stream(
                farm_id,
                || self.default_farm_config(),
                |stream, _| {
                    let alerts = check_sensor_reading(&reading, &stream.effective_thresholds());
                    stream.sensor_data.push(reading);
                    (alerts, stream.config.alerting_enabled)
                },
            )
            .await;

        tracing::debug!(farm_id, alerts = alerts.len(), "Sensor reading buffered");
        if alerting_enabled {
            self.emit_alerts(farm_id, events::FARM_NOTIFICATION, &alerts);
        }

        Ok(IngestReceipt {
            status: "received",
            data_id,
        })
    }

    pub async fn ingest_weather(&self, farm_id: &str, input: WeatherInput) -> AppResult<IngestReceipt> {
        validate_farm_id(farm_id)?;
        let reading = WeatherReading::from_input(input, Utc::now());
        let data_id = reading.timestamp;
        let alerts = check_extreme_weather(&reading);

        let alerting_enabled = self
            .with_stream(
                farm_id,
                || self.default_farm_config(),
                |stream, _| {
                    stream.weather_data.push(reading);
                    stream.config.alerting_enabled
                },
            )
            .await;

        tracing::debug!(farm_id, alerts = alerts.len(), "Weather reading buffered");
        if alerting_enabled {
            self.emit_alerts(farm_id, events::WEATHER_ALERT, &alerts);
        }

        Ok(IngestReceipt {
            status: "received",
            data_id,
        })
    }

    /// Buffer an image and start its scan in the background.
    ///
    /// Returns as soon as the scan is registered; progress and the result
    /// are only observable through `scan-update` events.
    pub async fn ingest_image(
        &self,
        farm_id: &str,
        submission: ImageSubmission,
    ) -> AppResult<ScanAccepted> {
        validate_farm_id(farm_id)?;
        if submission.image.trim().is_empty() {
            return Err(AppError::Validation {
                field: "image".to_string(),
                message: "image is required".to_string(),
            });
        }

        let now = Utc::now();
        let mut in_flight = self.in_flight.lock().await;
        let scan_id = self
            .with_stream(
                farm_id,
                || self.default_farm_config(),
                |stream, _| {
                    let mut rng = rand::thread_rng();
                    let scan_id = loop {
                        let candidate = ImageScan::scan_id(now, rng.gen_range(0..1000));
                        let taken = in_flight.contains(&candidate)
                            || stream.image_data.iter().any(|s| s.scan_id == candidate);
                        if !taken {
                            break candidate;
                        }
                    };

                    stream.image_data.push(ImageScan {
                        scan_id: scan_id.clone(),
                        image: submission.image.clone(),
                        location: submission.location,
                        metadata: submission.metadata.clone(),
                        timestamp: now,
                        processed: false,
                        result: None,
                    });
                    scan_id
                },
            )
            .await;
        in_flight.insert(scan_id.clone());
        drop(in_flight);

        self.sink.emit_to_farm(
            farm_id,
            events::SCAN_UPDATE,
            json!({
                "scanId": scan_id,
                "status": "processing",
                "progress": 0,
                "message": "Starting image analysis",
            }),
        );
        tracing::info!(farm_id, scan_id = %scan_id, "Image scan started");

        let job = ScanJob {
            farm_id: farm_id.to_string(),
            scan_id: scan_id.clone(),
            image: submission.image,
            location: submission.location,
        };
        let service = self.clone();
        tokio::spawn(async move { service.run_scan(job).await });

        Ok(ScanAccepted {
            status: "processing",
            scan_id,
            message: "Image scan initiated",
        })
    }

    /// Relay a treatment update to farm subscribers; nothing is stored
    pub async fn ingest_treatment_update(
        &self,
        farm_id: &str,
        mut update: Map<String, Value>,
    ) -> AppResult<TreatmentAccepted> {
        validate_farm_id(farm_id)?;
        validate_treatment_update(&update)?;

        if !update.contains_key("timestamp") {
            update.insert("timestamp".to_string(), json!(Utc::now()));
        }
        let treatment_id = update.get("treatmentId").cloned().unwrap_or(Value::Null);

        self.sink
            .emit_to_farm(farm_id, events::TREATMENT_PROGRESS, Value::Object(update));

        Ok(TreatmentAccepted {
            status: "processed",
            treatment_id,
        })
    }

    /// Merge `overlay` onto the farm's bands and return the result
    pub async fn update_thresholds(
        &self,
        farm_id: &str,
        overlay: ThresholdOverlay,
    ) -> AppResult<ThresholdsUpdated> {
        validate_farm_id(farm_id)?;
        validate_threshold_overlay(&overlay)?;

        let thresholds = self
            .with_stream(
                farm_id,
                || self.default_farm_config(),
                |stream, _| stream.apply_overlay(&overlay),
            )
            .await;
        tracing::info!(farm_id, "Alert thresholds updated");

        Ok(ThresholdsUpdated {
            farm_id: farm_id.to_string(),
            status: "updated",
            thresholds,
        })
    }

    /// One aggregator tick; `None` when the farm has no stream
    pub async fn process_batch(&self, farm_id: &str) -> Option<BatchOutcome> {
        self.process_batch_at(farm_id, Utc::now()).await
    }

    pub async fn process_batch_at(&self, farm_id: &str, now: DateTime<Utc>) -> Option<BatchOutcome> {
        let (outcome, region) = {
            let mut streams = self.streams.write().await;
            let stream = streams.get_mut(farm_id)?;
            let outcome = stream.run_batch(now, self.settings.retention());
            (outcome, stream.config.region.clone())
        };

        if let Some(analysis) = &outcome.soil_health {
            self.sink.emit_to_farm(
                farm_id,
                events::FARM_NOTIFICATION,
                json!({ "type": "soil_health", "data": analysis }),
            );
        }

        self.emit_alerts(farm_id, events::WEATHER_ALERT, &outcome.trend_alerts);
        if let Some(region) = &region {
            for alert in &outcome.trend_alerts {
                let mut payload = json!(alert);
                payload["farmId"] = json!(farm_id);
                self.sink
                    .emit_to_region(region, events::WEATHER_NOTIFICATION, payload);
            }
        }

        tracing::debug!(
            farm_id,
            sensor = outcome.sensor_processed,
            weather = outcome.weather_processed,
            evicted = outcome.evicted,
            "Batch processed"
        );
        Some(outcome)
    }

    fn emit_alerts(&self, farm_id: &str, event: &str, alerts: &[Alert]) {
        for alert in alerts {
            self.sink.emit_to_farm(farm_id, event, json!(alert));
        }
    }

    pub async fn farm_status(&self, farm_id: &str) -> AppResult<FarmStatus> {
        let timer_active = self.timers.lock().await.contains_key(farm_id);
        let streams = self.streams.read().await;
        let stream = streams
            .get(farm_id)
            .ok_or_else(|| AppError::NotFound(format!("Farm stream {}", farm_id)))?;

        Ok(FarmStatus {
            farm_id: stream.farm_id.clone(),
            sensor_readings: stream.sensor_data.len(),
            weather_readings: stream.weather_data.len(),
            image_scans: stream.image_data.len(),
            unprocessed_sensor: stream.sensor_data.iter().filter(|r| !r.processed).count(),
            unprocessed_weather: stream.weather_data.iter().filter(|r| !r.processed).count(),
            pending_scans: stream.image_data.iter().filter(|s| !s.processed).count(),
            last_processed: stream.last_processed,
            config: stream.config.clone(),
            thresholds: stream.effective_thresholds(),
            timer_active,
        })
    }

    /// Copy of a farm's stream, mostly for inspection in tests
    pub async fn snapshot(&self, farm_id: &str) -> Option<FarmStream> {
        self.streams.read().await.get(farm_id).cloned()
    }

    pub async fn active_farms(&self) -> usize {
        self.streams.read().await.len()
    }

    pub async fn in_flight_scans(&self) -> usize {
        self.in_flight.lock().await.len()
    }

    /// Cancel every farm timer
    pub async fn shutdown(&self) {
        let handles: Vec<JoinHandle<()>> =
            self.timers.lock().await.drain().map(|(_, handle)| handle).collect();
        let count = handles.len();
        for handle in handles {
            handle.abort();
        }

        tracing::info!(
            timers = count,
            in_flight_scans = self.in_flight.lock().await.len(),
            "Data processing shut down"
        );
    }
}
