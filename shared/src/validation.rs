//! Validation utilities for AgriGoo ingestion inputs

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{ThresholdBand, ThresholdOverlay};
use crate::types::Metric;

/// Reasons an input is rejected before it reaches a farm stream
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InputError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{field}: {reason}")]
    Invalid { field: String, reason: &'static str },
}

impl InputError {
    pub fn field(&self) -> &str {
        match self {
            InputError::MissingField { field } => field,
            InputError::Invalid { field, .. } => field,
        }
    }
}

/// Maximum accepted length of a farm or region identifier
pub const MAX_ID_LENGTH: usize = 128;

/// Validate a farm identifier (non-blank, bounded length)
pub fn validate_farm_id(farm_id: &str) -> Result<(), InputError> {
    if farm_id.trim().is_empty() {
        return Err(InputError::MissingField { field: "farmId" });
    }
    if farm_id.len() > MAX_ID_LENGTH {
        return Err(InputError::Invalid {
            field: "farmId".to_string(),
            reason: "must be at most 128 characters",
        });
    }
    Ok(())
}

/// Validate a band has finite, ordered edges
pub fn validate_threshold_band(metric: Metric, band: &ThresholdBand) -> Result<(), InputError> {
    if !band.min.is_finite() || !band.max.is_finite() {
        return Err(InputError::Invalid {
            field: metric.field_name().to_string(),
            reason: "threshold bounds must be finite numbers",
        });
    }
    if band.min > band.max {
        return Err(InputError::Invalid {
            field: metric.field_name().to_string(),
            reason: "min must not exceed max",
        });
    }
    Ok(())
}

/// Validate every band present in an overlay
pub fn validate_threshold_overlay(overlay: &ThresholdOverlay) -> Result<(), InputError> {
    overlay
        .bands()
        .try_for_each(|(metric, band)| validate_threshold_band(metric, &band))
}

/// Treatment updates must carry a non-empty `treatmentId` and `status`
pub fn validate_treatment_update(update: &Map<String, Value>) -> Result<(), InputError> {
    for field in ["treatmentId", "status"] {
        let present = match update.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        };
        if !present {
            return Err(InputError::MissingField { field });
        }
    }
    Ok(())
}
