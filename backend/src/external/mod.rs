//! External API integrations

pub mod disease_detection;

pub use disease_detection::{
    DetectorBackend, DiseaseDetector, HttpDiseaseDetector, MockDiseaseDetector,
};
