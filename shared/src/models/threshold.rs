//! Threshold bands and the immediate alert checks built on them

use serde::{Deserialize, Serialize};

use crate::models::{Alert, AlertKind, SensorReading, WeatherReading};
use crate::types::Metric;

/// Acceptable `[min, max]` range for one metric
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThresholdBand {
    pub min: f64,
    pub max: f64,
}

impl ThresholdBand {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// A complete set of bands, one per metric
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdSet {
    pub temperature: ThresholdBand,
    pub humidity: ThresholdBand,
    pub soil_moisture: ThresholdBand,
    pub rainfall: ThresholdBand,
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self {
            temperature: ThresholdBand::new(5.0, 35.0),
            humidity: ThresholdBand::new(30.0, 80.0),
            soil_moisture: ThresholdBand::new(20.0, 80.0),
            rainfall: ThresholdBand::new(0.0, 50.0),
        }
    }
}

impl ThresholdSet {
    pub fn band(&self, metric: Metric) -> ThresholdBand {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.humidity,
            Metric::SoilMoisture => self.soil_moisture,
            Metric::Rainfall => self.rainfall,
        }
    }

    /// Shallow merge: every band present in `overlay` replaces ours
    pub fn merged(&self, overlay: &ThresholdOverlay) -> Self {
        Self {
            temperature: overlay.temperature.unwrap_or(self.temperature),
            humidity: overlay.humidity.unwrap_or(self.humidity),
            soil_moisture: overlay.soil_moisture.unwrap_or(self.soil_moisture),
            rainfall: overlay.rainfall.unwrap_or(self.rainfall),
        }
    }
}

/// Partial band update for one farm
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdOverlay {
    pub temperature: Option<ThresholdBand>,
    pub humidity: Option<ThresholdBand>,
    pub soil_moisture: Option<ThresholdBand>,
    pub rainfall: Option<ThresholdBand>,
}

impl ThresholdOverlay {
    /// Bands present in this overlay
    pub fn bands(&self) -> impl Iterator<Item = (Metric, ThresholdBand)> {
        [
            (Metric::Temperature, self.temperature),
            (Metric::Humidity, self.humidity),
            (Metric::SoilMoisture, self.soil_moisture),
            (Metric::Rainfall, self.rainfall),
        ]
        .into_iter()
        .filter_map(|(metric, band)| band.map(|b| (metric, b)))
    }

    pub fn is_empty(&self) -> bool {
        self.bands().next().is_none()
    }
}

/// Check one value against a band
pub fn evaluate(metric: Metric, value: f64, band: ThresholdBand) -> Option<Alert> {
    if value < band.min {
        Some(
            Alert::new(
                AlertKind::low(metric),
                format!(
                    "{} below minimum threshold: {}{}",
                    metric.label(),
                    value,
                    metric.unit()
                ),
            )
            .with_value(value)
            .with_threshold(band.min),
        )
    } else if value > band.max {
        Some(
            Alert::new(
                AlertKind::high(metric),
                format!(
                    "{} above maximum threshold: {}{}",
                    metric.label(),
                    value,
                    metric.unit()
                ),
            )
            .with_value(value)
            .with_threshold(band.max),
        )
    } else {
        None
    }
}

/// Band checks for a sensor reading (temperature, humidity, soil moisture)
pub fn check_sensor_reading(reading: &SensorReading, thresholds: &ThresholdSet) -> Vec<Alert> {
    [
        (Metric::Temperature, reading.temperature),
        (Metric::Humidity, reading.humidity),
        (Metric::SoilMoisture, reading.soil_moisture),
    ]
    .into_iter()
    .filter_map(|(metric, value)| evaluate(metric, value?, thresholds.band(metric)))
    .collect()
}

pub const FREEZING_TEMPERATURE_C: f64 = 0.0;
pub const EXTREME_HEAT_C: f64 = 35.0;
pub const HEAVY_RAINFALL_MM: f64 = 30.0;
pub const HIGH_WIND_KMH: f64 = 50.0;

/// Fixed safety checks for a weather reading, independent of farm bands
pub fn check_extreme_weather(reading: &WeatherReading) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if let Some(temperature) = reading.temperature {
        if temperature < FREEZING_TEMPERATURE_C {
            alerts.push(
                Alert::new(
                    AlertKind::FreezingTemperature,
                    format!("Freezing temperature detected: {}°C", temperature),
                )
                .with_value(temperature),
            );
        } else if temperature > EXTREME_HEAT_C {
            alerts.push(
                Alert::new(
                    AlertKind::ExtremeHeat,
                    format!("Extreme heat detected: {}°C", temperature),
                )
                .with_value(temperature),
            );
        }
    }

    if let Some(rainfall) = reading.rainfall.filter(|r| *r > HEAVY_RAINFALL_MM) {
        alerts.push(
            Alert::new(
                AlertKind::HeavyRainfall,
                format!("Heavy rainfall detected: {}mm", rainfall),
            )
            .with_value(rainfall),
        );
    }

    if let Some(wind_speed) = reading.wind_speed.filter(|w| *w > HIGH_WIND_KMH) {
        alerts.push(
            Alert::new(
                AlertKind::HighWind,
                format!("High wind speed detected: {}km/h", wind_speed),
            )
            .with_value(wind_speed),
        );
    }

    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SensorInput, WeatherInput};
    use chrono::Utc;
    use proptest::prelude::*;

    fn sensor(temperature: f64, humidity: f64, soil_moisture: f64) -> SensorReading {
        SensorReading::from_input(
            SensorInput {
                temperature: Some(temperature),
                humidity: Some(humidity),
                soil_moisture: Some(soil_moisture),
                ..Default::default()
            },
            Utc::now(),
        )
    }

    fn weather(input: WeatherInput) -> WeatherReading {
        WeatherReading::from_input(input, Utc::now())
    }

    #[test]
    fn test_value_inside_band_raises_nothing() {
        let band = ThresholdBand::new(5.0, 35.0);
        assert!(evaluate(Metric::Temperature, 5.0, band).is_none());
        assert!(evaluate(Metric::Temperature, 35.0, band).is_none());
        assert!(evaluate(Metric::Temperature, 20.0, band).is_none());
    }

    #[test]
    fn test_low_and_high_alerts_carry_band_edge() {
        let band = ThresholdBand::new(30.0, 80.0);

        let low = evaluate(Metric::Humidity, 12.0, band).unwrap();
        assert_eq!(low.kind, AlertKind::LowHumidity);
        assert_eq!(low.threshold, Some(30.0));

        let high = evaluate(Metric::Humidity, 95.0, band).unwrap();
        assert_eq!(high.kind, AlertKind::HighHumidity);
        assert_eq!(high.threshold, Some(80.0));
        assert_eq!(high.value, Some(95.0));
    }

    #[test]
    fn test_cold_sensor_reading_raises_only_low_temperature() {
        let alerts = check_sensor_reading(&sensor(2.0, 50.0, 40.0), &ThresholdSet::default());

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::LowTemperature);
        assert_eq!(alerts[0].value, Some(2.0));
        assert_eq!(alerts[0].threshold, Some(5.0));
    }

    #[test]
    fn test_missing_metrics_are_skipped() {
        let reading = SensorReading::from_input(SensorInput::default(), Utc::now());
        assert!(check_sensor_reading(&reading, &ThresholdSet::default()).is_empty());
    }

    #[test]
    fn test_merge_keeps_unset_bands() {
        let overlay = ThresholdOverlay {
            humidity: Some(ThresholdBand::new(40.0, 70.0)),
            ..Default::default()
        };
        let merged = ThresholdSet::default().merged(&overlay);

        assert_eq!(merged.humidity, ThresholdBand::new(40.0, 70.0));
        assert_eq!(merged.temperature, ThresholdSet::default().temperature);
        assert_eq!(merged.rainfall, ThresholdSet::default().rainfall);
    }

    #[test]
    fn test_freezing_weather() {
        let alerts = check_extreme_weather(&weather(WeatherInput {
            temperature: Some(-3.0),
            ..Default::default()
        }));

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::FreezingTemperature);
        assert_eq!(alerts[0].value, Some(-3.0));
    }

    #[test]
    fn test_extreme_weather_checks_fire_independently() {
        let alerts = check_extreme_weather(&weather(WeatherInput {
            temperature: Some(40.0),
            rainfall: Some(31.0),
            wind_speed: Some(65.0),
            ..Default::default()
        }));

        let kinds: Vec<_> = alerts.iter().map(|a| a.kind).collect();
        assert_eq!(
            kinds,
            vec![AlertKind::ExtremeHeat, AlertKind::HeavyRainfall, AlertKind::HighWind]
        );
    }

    #[test]
    fn test_boundary_values_do_not_fire() {
        let alerts = check_extreme_weather(&weather(WeatherInput {
            temperature: Some(35.0),
            rainfall: Some(30.0),
            wind_speed: Some(50.0),
            ..Default::default()
        }));
        assert!(alerts.is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_heavy_rainfall_iff_above_thirty(rainfall in 0.0f64..200.0) {
            let alerts = check_extreme_weather(&weather(WeatherInput {
                rainfall: Some(rainfall),
                ..Default::default()
            }));
            let fired = alerts.iter().any(|a| a.kind == AlertKind::HeavyRainfall);
            prop_assert_eq!(fired, rainfall > 30.0);
        }

        #[test]
        fn prop_below_min_gives_one_low_alert(
            min in -20.0f64..20.0,
            width in 0.0f64..40.0,
            below in 0.001f64..30.0,
        ) {
            let band = ThresholdBand::new(min, min + width);
            let set = ThresholdSet { temperature: band, ..ThresholdSet::default() };
            let value = min - below;

            let alerts = check_sensor_reading(&sensor(value, 50.0, 50.0), &set);
            let low: Vec<_> = alerts
                .iter()
                .filter(|a| a.kind == AlertKind::LowTemperature)
                .collect();

            prop_assert_eq!(low.len(), 1);
            prop_assert_eq!(low[0].value, Some(value));
            prop_assert_eq!(low[0].threshold, Some(min));
        }

        #[test]
        fn prop_merge_is_idempotent(
            t_min in -10.0f64..10.0,
            h_min in 0.0f64..50.0,
        ) {
            let overlay = ThresholdOverlay {
                temperature: Some(ThresholdBand::new(t_min, t_min + 30.0)),
                humidity: Some(ThresholdBand::new(h_min, h_min + 30.0)),
                ..Default::default()
            };
            let once = ThresholdSet::default().merged(&overlay);
            let twice = once.merged(&overlay);
            prop_assert_eq!(once, twice);
        }
    }
}
