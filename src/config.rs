//! Configuration system for the docweave orchestrator
//!
//! TOML-based configuration with environment-variable indirection for
//! credentials: the file names the variable holding the API key, never the
//! key itself.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Main orchestrator configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrchestratorConfig {
    pub pipeline: PipelineSection,
    pub endpoint: EndpointSection,
    #[serde(default)]
    pub retry: RetrySection,
}

/// Pipeline selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineSection {
    /// Name of the strategy to run (must exist in the catalog)
    pub strategy: String,
    /// Key under which this pipeline's messages are stored
    pub pipeline_key: String,
}

/// Generation endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EndpointSection {
    /// Base URL of the generation service
    pub base_url: String,
    /// Environment variable containing the API key
    pub api_key_env: Option<String>,
    /// Request timeout in seconds (default: 120)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    120
}

/// Bounded retry settings for invalid or failed step attempts
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrySection {
    /// Maximum attempts per step before giving up (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Backoff before the first retry, in milliseconds (default: 500)
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Multiplier applied to the backoff after each failed attempt (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl OrchestratorConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: OrchestratorConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.strategy.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "pipeline.strategy must not be empty".to_string(),
            ));
        }
        if self.pipeline.pipeline_key.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "pipeline.pipeline_key must not be empty".to_string(),
            ));
        }
        if !self.endpoint.base_url.starts_with("http://")
            && !self.endpoint.base_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidConfig(format!(
                "endpoint.base_url must be an http(s) URL, got '{}'",
                self.endpoint.base_url
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::InvalidConfig(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(ConfigError::InvalidConfig(
                "retry.backoff_multiplier must be >= 1.0".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the API key from the configured environment variable
    pub fn api_key(&self) -> Result<Option<String>, ConfigError> {
        match &self.endpoint.api_key_env {
            None => Ok(None),
            Some(var) => std::env::var(var)
                .map(Some)
                .map_err(|_| ConfigError::EnvVarNotFound(var.clone())),
        }
    }
}
