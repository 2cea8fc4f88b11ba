//! Disease detection results and spread prediction

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::WeatherConditions;
use crate::types::GeoPoint;

/// Output of one disease-detection call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    /// Model class label, e.g. `Tomato___Late_blight`
    pub disease: String,
    /// 0..1
    pub confidence: f64,
    pub is_healthy: bool,
    pub timestamp: DateTime<Utc>,
    /// Set when the result came from the fallback generator
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_mock: bool,
}

/// Disease families with their own weather sensitivity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiseaseFamily {
    Blight,
    Rust,
    Other,
}

impl DiseaseFamily {
    /// Classify a label by substring, case-insensitively
    pub fn of(disease: &str) -> Self {
        let lower = disease.to_lowercase();
        if lower.contains("blight") {
            DiseaseFamily::Blight
        } else if lower.contains("rust") {
            DiseaseFamily::Rust
        } else {
            DiseaseFamily::Other
        }
    }

    /// (humidity, temperature, rainfall) weights
    fn weights(&self) -> (f64, f64, f64) {
        match self {
            DiseaseFamily::Blight => (0.6, 0.3, 0.1),
            DiseaseFamily::Rust => (0.4, 0.2, 0.4),
            DiseaseFamily::Other => (0.4, 0.4, 0.2),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Severe,
}

impl RiskLevel {
    pub fn from_spread_factor(spread_factor: f64) -> Self {
        match spread_factor {
            s if s < 30.0 => RiskLevel::Low,
            s if s < 60.0 => RiskLevel::Medium,
            s if s < 80.0 => RiskLevel::High,
            _ => RiskLevel::Severe,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
            RiskLevel::Severe => "Severe",
        }
    }

    pub fn recommendations(&self) -> &'static [&'static str] {
        match self {
            RiskLevel::Low => &[
                "Monitor crops regularly",
                "Ensure proper spacing between plants",
                "Consider preventative fungicide application",
            ],
            RiskLevel::Medium => &[
                "Apply appropriate fungicide/treatment",
                "Increase monitoring frequency",
                "Remove any infected plants",
                "Improve air circulation",
            ],
            RiskLevel::High => &[
                "Immediate treatment application required",
                "Isolate affected areas",
                "Consider crop rotation for next season",
                "Implement strict sanitation protocols",
            ],
            RiskLevel::Severe => &[
                "Urgent treatment required",
                "Consider removing severely affected crops",
                "Notify neighboring farms",
                "Implement containment measures",
                "Consult with agricultural extension services",
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AffectedArea {
    pub center: GeoPoint,
    pub radius_km: f64,
    pub affected_farms: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SpreadPrediction {
    pub disease: String,
    /// 0..100
    pub spread_factor: f64,
    pub risk_level: RiskLevel,
    pub affected_area: AffectedArea,
    pub recommendations: Vec<String>,
}

/// Inputs for a spread prediction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadRequest {
    pub disease: String,
    #[serde(default)]
    pub location: GeoPoint,
    #[serde(default)]
    pub weather_data: WeatherConditions,
}

const BASE_RADIUS_KM: f64 = 2.0;
const MAX_RADIUS_KM: f64 = 20.0;

/// Weighted weather score for a disease, clamped to 0..100
pub fn spread_factor(disease: &str, weather: &WeatherConditions) -> f64 {
    let (w_humidity, w_temperature, w_rainfall) = DiseaseFamily::of(disease).weights();
    let factor = weather.humidity * w_humidity
        + weather.temperature * w_temperature
        + weather.rainfall * w_rainfall;

    if factor.is_nan() {
        return 0.0;
    }
    factor.clamp(0.0, 100.0)
}

pub fn predict_spread(request: &SpreadRequest) -> SpreadPrediction {
    let factor = spread_factor(&request.disease, &request.weather_data);
    let risk_level = RiskLevel::from_spread_factor(factor);

    SpreadPrediction {
        disease: request.disease.clone(),
        spread_factor: factor,
        risk_level,
        affected_area: AffectedArea {
            center: request.location,
            radius_km: BASE_RADIUS_KM + (MAX_RADIUS_KM - BASE_RADIUS_KM) * (factor / 100.0),
            affected_farms: (5.0 + factor / 10.0).floor() as u32,
        },
        recommendations: risk_level
            .recommendations()
            .iter()
            .map(|r| r.to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn conditions(temperature: f64, humidity: f64, rainfall: f64) -> WeatherConditions {
        WeatherConditions {
            temperature,
            humidity,
            rainfall,
        }
    }

    #[test]
    fn test_family_classification() {
        assert_eq!(DiseaseFamily::of("Tomato___Late_blight"), DiseaseFamily::Blight);
        assert_eq!(
            DiseaseFamily::of("Corn_(maize)___Northern_Leaf_Blight"),
            DiseaseFamily::Blight
        );
        assert_eq!(DiseaseFamily::of("Corn_(maize)___Common_rust"), DiseaseFamily::Rust);
        assert_eq!(DiseaseFamily::of("Tomato___Leaf_Mold"), DiseaseFamily::Other);
    }

    #[test]
    fn test_blight_weights() {
        // 90*0.6 + 20*0.3 + 10*0.1 = 61
        let factor = spread_factor("Potato___Early_blight", &conditions(20.0, 90.0, 10.0));
        assert!((factor - 61.0).abs() < 1e-9);
        assert_eq!(RiskLevel::from_spread_factor(factor), RiskLevel::High);
    }

    #[test]
    fn test_rust_weights() {
        // 50*0.4 + 30*0.4 + 25*0.2 = 37
        let factor = spread_factor("Apple___Cedar_apple_rust", &conditions(25.0, 50.0, 30.0));
        assert!((factor - 37.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_weather_prediction() {
        // 60*0.4 + 25*0.4 + 0*0.2 = 34
        let prediction = predict_spread(&SpreadRequest {
            disease: "Tomato___Bacterial_spot".to_string(),
            location: GeoPoint::new(1.0, 2.0),
            weather_data: WeatherConditions::default(),
        });

        assert!((prediction.spread_factor - 34.0).abs() < 1e-9);
        assert_eq!(prediction.risk_level, RiskLevel::Medium);
        assert!((prediction.affected_area.radius_km - 8.12).abs() < 1e-9);
        assert_eq!(prediction.affected_area.affected_farms, 8);
        assert_eq!(prediction.affected_area.center, GeoPoint::new(1.0, 2.0));
        assert_eq!(prediction.recommendations.len(), 4);
    }

    #[test]
    fn test_extreme_weather_is_severe() {
        // 100*0.6 + 40*0.3 + 200*0.1 = 92
        let prediction = predict_spread(&SpreadRequest {
            disease: "Tomato___Late_blight".to_string(),
            location: GeoPoint::default(),
            weather_data: conditions(40.0, 100.0, 200.0),
        });
        assert!((prediction.spread_factor - 92.0).abs() < 1e-9);
        assert_eq!(prediction.risk_level, RiskLevel::Severe);
        assert!((prediction.affected_area.radius_km - (2.0 + 18.0 * 0.92)).abs() < 1e-9);
        assert_eq!(prediction.affected_area.affected_farms, 14);
    }

    #[test]
    fn test_spread_factor_clamped_at_100() {
        let prediction = predict_spread(&SpreadRequest {
            disease: "Tomato___Late_blight".to_string(),
            location: GeoPoint::default(),
            weather_data: conditions(40.0, 150.0, 200.0),
        });
        assert_eq!(prediction.spread_factor, 100.0);
        assert_eq!(prediction.risk_level, RiskLevel::Severe);
        assert_eq!(prediction.affected_area.radius_km, 20.0);
        assert_eq!(prediction.affected_area.affected_farms, 15);
    }

    #[test]
    fn test_risk_level_boundaries() {
        assert_eq!(RiskLevel::from_spread_factor(29.99), RiskLevel::Low);
        assert_eq!(RiskLevel::from_spread_factor(30.0), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_spread_factor(60.0), RiskLevel::High);
        assert_eq!(RiskLevel::from_spread_factor(80.0), RiskLevel::Severe);
    }

    #[test]
    fn test_detection_result_json_shape() {
        let json = serde_json::json!({
            "disease": "Tomato___healthy",
            "confidence": 0.95,
            "isHealthy": true,
            "timestamp": "2024-05-01T00:00:00Z"
        });
        let result: DetectionResult = serde_json::from_value(json).unwrap();
        assert!(result.is_healthy);
        assert!(!result.is_mock);

        let back = serde_json::to_value(&result).unwrap();
        assert!(back.get("isMock").is_none());
    }

    proptest! {
        #[test]
        fn prop_spread_factor_bounded(
            temperature in -100.0f64..100.0,
            humidity in -100.0f64..200.0,
            rainfall in -50.0f64..500.0,
            label in prop::sample::select(vec!["Late_blight", "Common_rust", "Leaf_Mold"]),
        ) {
            let factor = spread_factor(label, &conditions(temperature, humidity, rainfall));
            prop_assert!((0.0..=100.0).contains(&factor));
        }
    }
}
