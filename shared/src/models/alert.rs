//! Alert models
//!
//! Alerts are transient: they are built by the threshold and weather checks
//! and handed straight to the notification sink.

use serde::{Deserialize, Serialize};

use crate::types::Metric;

/// Every alert kind the pipeline can raise
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    // Configurable band violations
    LowTemperature,
    HighTemperature,
    LowHumidity,
    HighHumidity,
    LowSoilMoisture,
    HighSoilMoisture,
    LowRainfall,
    HighRainfall,

    // Fixed extreme-weather checks
    FreezingTemperature,
    ExtremeHeat,
    HeavyRainfall,
    HighWind,

    // Trend checks over buffered weather
    FrostRisk,
    DiseaseRisk,
}

impl AlertKind {
    /// Kind raised when `metric` falls below its band
    pub fn low(metric: Metric) -> Self {
        match metric {
            Metric::Temperature => AlertKind::LowTemperature,
            Metric::Humidity => AlertKind::LowHumidity,
            Metric::SoilMoisture => AlertKind::LowSoilMoisture,
            Metric::Rainfall => AlertKind::LowRainfall,
        }
    }

    /// Kind raised when `metric` rises above its band
    pub fn high(metric: Metric) -> Self {
        match metric {
            Metric::Temperature => AlertKind::HighTemperature,
            Metric::Humidity => AlertKind::HighHumidity,
            Metric::SoilMoisture => AlertKind::HighSoilMoisture,
            Metric::Rainfall => AlertKind::HighRainfall,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::LowTemperature => "low_temperature",
            AlertKind::HighTemperature => "high_temperature",
            AlertKind::LowHumidity => "low_humidity",
            AlertKind::HighHumidity => "high_humidity",
            AlertKind::LowSoilMoisture => "low_soil_moisture",
            AlertKind::HighSoilMoisture => "high_soil_moisture",
            AlertKind::LowRainfall => "low_rainfall",
            AlertKind::HighRainfall => "high_rainfall",
            AlertKind::FreezingTemperature => "freezing_temperature",
            AlertKind::ExtremeHeat => "extreme_heat",
            AlertKind::HeavyRainfall => "heavy_rainfall",
            AlertKind::HighWind => "high_wind",
            AlertKind::FrostRisk => "frost_risk",
            AlertKind::DiseaseRisk => "disease_risk",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single alert, serialized as the notification payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    /// Earlier value compared against, for trend alerts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difference: Option<f64>,
}

impl Alert {
    pub fn new(kind: AlertKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            value: None,
            threshold: None,
            previous: None,
            difference: None,
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Attach the earlier reading of a trend comparison
    pub fn with_previous(mut self, previous: f64, difference: f64) -> Self {
        self.previous = Some(previous);
        self.difference = Some(difference);
        self
    }
}
