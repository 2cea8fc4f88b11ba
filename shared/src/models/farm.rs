//! Per-farm processing configuration

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Default batch interval for a farm
pub const DEFAULT_PROCESSING_INTERVAL_MS: u64 = 60_000;

/// Processing configuration of a farm stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FarmConfig {
    /// Milliseconds between periodic batch runs
    pub processing_interval: u64,
    /// Immediate threshold and extreme-weather alerts are sent only when set
    pub alerting_enabled: bool,
    /// Region room that also receives outbreak and trend alerts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            processing_interval: DEFAULT_PROCESSING_INTERVAL_MS,
            alerting_enabled: true,
            region: None,
        }
    }
}

impl FarmConfig {
    /// Apply caller overrides on top of `self`
    pub fn with_overrides(mut self, input: &FarmConfigInput) -> Self {
        if let Some(interval) = input.processing_interval {
            self.processing_interval = interval;
        }
        if let Some(enabled) = input.alerting_enabled {
            self.alerting_enabled = enabled;
        }
        if let Some(region) = &input.region {
            self.region = Some(region.clone());
        }
        self
    }
}

/// Caller-supplied overrides at farm initialisation
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FarmConfigInput {
    #[validate(range(min = 1, message = "processingInterval must be at least 1ms"))]
    pub processing_interval: Option<u64>,
    pub alerting_enabled: Option<bool>,
    #[validate(length(min = 1, max = 128, message = "region must be 1-128 characters"))]
    pub region: Option<String>,
}
