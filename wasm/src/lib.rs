//! WebAssembly module for the AgriGoo dashboard
//!
//! Provides client-side computation for:
//! - Soil health scoring
//! - Disease spread prediction
//! - Threshold and extreme-weather checks on draft readings
//!
//! Complex values cross the boundary as JSON strings.

use serde::{de::DeserializeOwned, Serialize};
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;
pub use shared::validation::*;

fn parse<T: DeserializeOwned>(json: &str, what: &str) -> Result<T, String> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {} JSON: {}", what, e))
}

fn render<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization failed: {}", e))
}

fn soil_health(sample_json: &str) -> Result<String, String> {
    let sample: SoilSample = parse(sample_json, "soil sample")?;
    render(&analyze_soil_health(&sample))
}

fn spread(request_json: &str) -> Result<String, String> {
    let request: SpreadRequest = parse(request_json, "spread request")?;
    render(&predict_spread(&request))
}

fn sensor_alerts(reading_json: &str, thresholds_json: &str) -> Result<String, String> {
    let input: SensorInput = parse(reading_json, "sensor reading")?;
    let thresholds = if thresholds_json.trim().is_empty() {
        ThresholdSet::default()
    } else {
        let overlay: ThresholdOverlay = parse(thresholds_json, "thresholds")?;
        validate_threshold_overlay(&overlay).map_err(|e| e.to_string())?;
        ThresholdSet::default().merged(&overlay)
    };

    let reading = SensorReading::from_input(input, unstamped());
    render(&check_sensor_reading(&reading, &thresholds))
}

fn weather_alerts(reading_json: &str) -> Result<String, String> {
    let input: WeatherInput = parse(reading_json, "weather reading")?;
    let reading = WeatherReading::from_input(input, unstamped());
    render(&check_extreme_weather(&reading))
}

// Readings checked client-side are never buffered
fn unstamped() -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::UNIX_EPOCH
}

/// Score a soil sample; returns the analysis as JSON
#[wasm_bindgen]
pub fn analyze_soil(sample_json: &str) -> Result<String, JsValue> {
    soil_health(sample_json).map_err(|e| JsValue::from_str(&e))
}

/// Predict how far a detected disease may spread; returns the prediction as JSON
#[wasm_bindgen]
pub fn predict_disease_spread(request_json: &str) -> Result<String, JsValue> {
    spread(request_json).map_err(|e| JsValue::from_str(&e))
}

/// Classify a spread factor (0-100) into a risk level
#[wasm_bindgen]
pub fn risk_level_for(spread_factor: f64) -> String {
    RiskLevel::from_spread_factor(spread_factor).as_str().to_string()
}

/// Check a sensor reading against the default bands, optionally overlaid
/// with `thresholds_json`; returns the alerts as a JSON array
#[wasm_bindgen]
pub fn check_sensor_thresholds(reading_json: &str, thresholds_json: &str) -> Result<String, JsValue> {
    sensor_alerts(reading_json, thresholds_json).map_err(|e| JsValue::from_str(&e))
}

/// Fixed extreme-weather checks; returns the alerts as a JSON array
#[wasm_bindgen]
pub fn check_weather_extremes(reading_json: &str) -> Result<String, JsValue> {
    weather_alerts(reading_json).map_err(|e| JsValue::from_str(&e))
}

/// Validate a single threshold band before submitting it
#[wasm_bindgen]
pub fn is_valid_threshold_band(min: f64, max: f64) -> bool {
    validate_threshold_band(Metric::Temperature, &ThresholdBand::new(min, max)).is_ok()
}
