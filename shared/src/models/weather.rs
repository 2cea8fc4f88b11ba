//! Weather trend analysis over a batch of buffered readings

use crate::models::{Alert, AlertKind, WeatherReading};

/// Minimum batch size before trends are evaluated
pub const MIN_TREND_READINGS: usize = 3;

const FROST_DROP_C: f64 = 5.0;
const HUMIDITY_JUMP: f64 = 15.0;
const DISEASE_HUMIDITY: f64 = 80.0;
const TREND_HEAVY_RAINFALL_MM: f64 = 20.0;

/// Compare the two most recent readings of a batch.
///
/// Readings are ordered by timestamp first; batches smaller than
/// [`MIN_TREND_READINGS`] produce no alerts.
pub fn analyze_weather_trends(readings: &[WeatherReading]) -> Vec<Alert> {
    if readings.len() < MIN_TREND_READINGS {
        return Vec::new();
    }

    let mut sorted: Vec<&WeatherReading> = readings.iter().collect();
    sorted.sort_by_key(|r| r.timestamp);

    let latest = sorted[sorted.len() - 1];
    let previous = sorted[sorted.len() - 2];
    let mut alerts = Vec::new();

    if let (Some(current), Some(before)) = (latest.temperature, previous.temperature) {
        if current < before - FROST_DROP_C {
            alerts.push(
                Alert::new(
                    AlertKind::FrostRisk,
                    "Rapid temperature drop detected. Potential frost risk.",
                )
                .with_value(current)
                .with_previous(before, before - current),
            );
        }
    }

    if let (Some(current), Some(before)) = (latest.humidity, previous.humidity) {
        if current > before + HUMIDITY_JUMP && current > DISEASE_HUMIDITY {
            alerts.push(
                Alert::new(
                    AlertKind::DiseaseRisk,
                    "Rapid humidity increase detected. Conditions favorable for disease development.",
                )
                .with_value(current)
                .with_previous(before, current - before),
            );
        }
    }

    if let Some(rainfall) = latest.rainfall.filter(|r| *r > TREND_HEAVY_RAINFALL_MM) {
        alerts.push(
            Alert::new(
                AlertKind::HeavyRainfall,
                "Heavy rainfall detected. Check for flooding and drainage issues.",
            )
            .with_value(rainfall),
        );
    }

    alerts
}
