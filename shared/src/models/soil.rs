//! Soil health scoring

use serde::{Deserialize, Serialize};

/// Soil chemistry and conditions used for scoring
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SoilSample {
    #[serde(rename = "pH")]
    pub ph: f64,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    /// Defaults to 50% when the sensor did not report it
    pub moisture: Option<f64>,
    /// Defaults to 20°C when the sensor did not report it
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SoilHealthStatus {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl SoilHealthStatus {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 80.0 => SoilHealthStatus::Excellent,
            s if s >= 60.0 => SoilHealthStatus::Good,
            s if s >= 40.0 => SoilHealthStatus::Fair,
            _ => SoilHealthStatus::Poor,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SoilDeficiency {
    Nitrogen,
    Phosphorus,
    Potassium,
    #[serde(rename = "pH (too acidic)")]
    Acidic,
    #[serde(rename = "pH (too alkaline)")]
    Alkaline,
}

impl SoilDeficiency {
    fn recommendations(&self) -> [&'static str; 2] {
        match self {
            SoilDeficiency::Nitrogen => [
                "Apply nitrogen-rich fertilizer",
                "Consider planting nitrogen-fixing cover crops",
            ],
            SoilDeficiency::Phosphorus => [
                "Apply phosphate fertilizer",
                "Add bone meal or rock phosphate for organic options",
            ],
            SoilDeficiency::Potassium => [
                "Apply potassium-rich fertilizer",
                "Add wood ash or greensand for organic options",
            ],
            SoilDeficiency::Acidic => [
                "Apply agricultural lime to raise pH",
                "Consider adding wood ash",
            ],
            SoilDeficiency::Alkaline => [
                "Add sulfur or aluminum sulfate to lower pH",
                "Consider organic matter like pine needles or peat moss",
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SoilHealthAnalysis {
    /// Rounded, 0..100
    pub health_score: u8,
    pub status: SoilHealthStatus,
    pub deficiencies: Vec<SoilDeficiency>,
    pub recommendations: Vec<String>,
}

const IDEAL_PH: f64 = 6.5;
const IDEAL_MOISTURE: f64 = 50.0;
const DEFAULT_SOIL_TEMPERATURE: f64 = 20.0;
const NUTRIENT_MINIMUM: f64 = 50.0;

/// Weighted 0..100 score; never NaN, whatever the inputs
pub fn soil_health_score(sample: &SoilSample) -> f64 {
    let moisture = sample.moisture.unwrap_or(IDEAL_MOISTURE);
    let temperature = sample.temperature.unwrap_or(DEFAULT_SOIL_TEMPERATURE);

    let ph_factor = 100.0 - (sample.ph - IDEAL_PH).abs() * 20.0;
    let npk_factor =
        (sample.nitrogen / 100.0 + sample.phosphorus / 100.0 + sample.potassium / 100.0) * 33.3;
    let moisture_factor = 100.0 - (moisture - IDEAL_MOISTURE).abs() * 2.0;
    let temperature_factor = if temperature > 10.0 && temperature < 30.0 {
        100.0
    } else {
        100.0 - (temperature - DEFAULT_SOIL_TEMPERATURE).abs() * 5.0
    };

    let score = ph_factor * 0.3 + npk_factor * 0.3 + moisture_factor * 0.25 + temperature_factor * 0.15;
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 100.0)
}

pub fn soil_deficiencies(sample: &SoilSample) -> Vec<SoilDeficiency> {
    let mut deficiencies = Vec::new();
    if sample.nitrogen < NUTRIENT_MINIMUM {
        deficiencies.push(SoilDeficiency::Nitrogen);
    }
    if sample.phosphorus < NUTRIENT_MINIMUM {
        deficiencies.push(SoilDeficiency::Phosphorus);
    }
    if sample.potassium < NUTRIENT_MINIMUM {
        deficiencies.push(SoilDeficiency::Potassium);
    }
    if sample.ph < 5.5 {
        deficiencies.push(SoilDeficiency::Acidic);
    }
    if sample.ph > 7.5 {
        deficiencies.push(SoilDeficiency::Alkaline);
    }
    deficiencies
}

pub fn analyze_soil_health(sample: &SoilSample) -> SoilHealthAnalysis {
    let score = soil_health_score(sample);
    let deficiencies = soil_deficiencies(sample);

    let mut recommendations = vec!["Regular soil testing every 1-2 years".to_string()];
    for deficiency in &deficiencies {
        recommendations.extend(deficiency.recommendations().iter().map(|r| r.to_string()));
    }

    let moisture = sample.moisture.unwrap_or(IDEAL_MOISTURE);
    if moisture < 30.0 {
        recommendations.push("Increase irrigation frequency".to_string());
        recommendations.push("Add organic matter to improve water retention".to_string());
    } else if moisture > 70.0 {
        recommendations.push("Improve drainage".to_string());
        recommendations.push("Reduce irrigation frequency".to_string());
    }

    SoilHealthAnalysis {
        health_score: score.round() as u8,
        status: SoilHealthStatus::from_score(score),
        deficiencies,
        recommendations,
    }
}
