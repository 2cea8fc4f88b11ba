//! Configuration management for the AgriGoo farm pipeline
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with AGRIGOO__ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Disease detection service configuration
    pub detection: DetectionConfig,

    /// Farm stream processing configuration
    pub processing: ProcessingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for verifying HS256 tokens
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DetectionConfig {
    /// Detection API endpoint; the mock detector is used when unset
    pub api_url: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Optional API key sent as `x-api-key`
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProcessingConfig {
    /// Batch interval for farms initialised without an override
    pub default_interval_ms: u64,

    /// Readings older than this are evicted on every batch run
    pub retention_hours: i64,

    /// Pause between the 30% and 60% scan progress updates
    pub scan_stage_delay_ms: u64,

    /// Capacity of the realtime broadcast channel
    pub channel_capacity: usize,
}

impl ProcessingConfig {
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::hours(self.retention_hours)
    }

    pub fn scan_stage_delay(&self) -> Duration {
        Duration::from_millis(self.scan_stage_delay_ms)
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("AGRIGOO_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 5000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("jwt.secret", "development-secret-key")?
            .set_default("detection.timeout_secs", 30)?
            .set_default("processing.default_interval_ms", 60_000)?
            .set_default("processing.retention_hours", 24)?
            .set_default("processing.scan_stage_delay_ms", 1_500)?
            .set_default("processing.channel_capacity", 1_024)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (AGRIGOO__ prefix)
            .add_source(
                Environment::with_prefix("AGRIGOO")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            jwt: JwtConfig {
                secret: "development-secret-key".to_string(),
            },
            detection: DetectionConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            timeout_secs: 30,
            api_key: None,
        }
    }
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            default_interval_ms: shared::DEFAULT_PROCESSING_INTERVAL_MS,
            retention_hours: 24,
            scan_stage_delay_ms: 1_500,
            channel_capacity: 1_024,
        }
    }
}
