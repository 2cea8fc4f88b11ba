//! Farm telemetry readings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::DetectionResult;
use crate::types::GeoPoint;

/// Sensor values as submitted by a device
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensorInput {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub soil_temperature: Option<f64>,
    #[serde(rename = "pH")]
    pub ph: Option<f64>,
    pub nitrogen: Option<f64>,
    pub phosphorus: Option<f64>,
    pub potassium: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// A buffered sensor reading
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub soil_temperature: Option<f64>,
    #[serde(rename = "pH")]
    pub ph: Option<f64>,
    pub nitrogen: Option<f64>,
    pub phosphorus: Option<f64>,
    pub potassium: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub processed: bool,
}

impl SensorReading {
    /// Stamp an input, using `now` when the device sent no timestamp
    pub fn from_input(input: SensorInput, now: DateTime<Utc>) -> Self {
        Self {
            temperature: input.temperature,
            humidity: input.humidity,
            soil_moisture: input.soil_moisture,
            soil_temperature: input.soil_temperature,
            ph: input.ph,
            nitrogen: input.nitrogen,
            phosphorus: input.phosphorus,
            potassium: input.potassium,
            timestamp: input.timestamp.unwrap_or(now),
            processed: false,
        }
    }

    /// Soil sample built from this reading when it carries pH and all of N, P, K
    pub fn soil_sample(&self) -> Option<crate::models::SoilSample> {
        Some(crate::models::SoilSample {
            ph: self.ph?,
            nitrogen: self.nitrogen?,
            phosphorus: self.phosphorus?,
            potassium: self.potassium?,
            moisture: self.soil_moisture,
            temperature: self.soil_temperature,
        })
    }
}

/// Weather values as submitted by a station
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherInput {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub rainfall: Option<f64>,
    pub wind_speed: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// A buffered weather reading
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReading {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub rainfall: Option<f64>,
    /// km/h
    pub wind_speed: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub processed: bool,
}

impl WeatherReading {
    pub fn from_input(input: WeatherInput, now: DateTime<Utc>) -> Self {
        Self {
            temperature: input.temperature,
            humidity: input.humidity,
            rainfall: input.rainfall,
            wind_speed: input.wind_speed,
            timestamp: input.timestamp.unwrap_or(now),
            processed: false,
        }
    }
}

/// Weather conditions fed into spread prediction
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WeatherConditions {
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
}

impl Default for WeatherConditions {
    fn default() -> Self {
        Self {
            temperature: 25.0,
            humidity: 60.0,
            rainfall: 0.0,
        }
    }
}

impl From<&WeatherReading> for WeatherConditions {
    /// Missing values fall back to the defaults individually
    fn from(reading: &WeatherReading) -> Self {
        let defaults = WeatherConditions::default();
        Self {
            temperature: reading.temperature.unwrap_or(defaults.temperature),
            humidity: reading.humidity.unwrap_or(defaults.humidity),
            rainfall: reading.rainfall.unwrap_or(defaults.rainfall),
        }
    }
}

/// An image submitted for disease detection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageScan {
    pub scan_id: String,
    /// Base64 payload, optionally as a data URL
    #[serde(skip_serializing)]
    pub image: String,
    pub location: Option<GeoPoint>,
    pub metadata: Option<serde_json::Value>,
    pub timestamp: DateTime<Utc>,
    pub processed: bool,
    pub result: Option<DetectionResult>,
}

impl ImageScan {
    /// Build the scan id from the submission time and a random suffix in 0..1000
    pub fn scan_id(now: DateTime<Utc>, suffix: u16) -> String {
        format!("scan-{}-{}", now.timestamp_millis(), suffix % 1000)
    }
}
