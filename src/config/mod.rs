mod env_manager;

use crate::error::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use env_manager::{apply_overrides, get_env_value};

/// Main configuration struct for the analyzer
///
/// Loaded from TOML; every field has a default so a partial file (or no
/// file at all) is valid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Text-generation endpoint settings
    pub model: ModelSettings,
    /// Request spacing and throttle handling
    pub rate_limits: RateLimits,
}

/// Settings for the text-generation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// API key; usually supplied through the environment
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// Base URL of the generative language API
    pub endpoint: String,
    /// Transport timeout for a single request
    pub timeout_seconds: u64,
}

/// Rate limit settings for the text-generation endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimits {
    /// Minimum gap between requests in milliseconds
    pub delay_between_requests_ms: u64,
    /// Throttle backoff as a multiple of the request gap
    pub backoff_multiplier: u32,
    /// Attempts per request, including the first
    pub max_attempts: u32,
    /// Upper bound of random jitter added to throttle backoff, in milliseconds
    pub jitter_ms: u64,
    /// Documented endpoint quota per minute; informational
    pub requests_per_minute: u32,
    /// Advisory daily budget; exceeding it is logged, not enforced
    pub requests_per_day: u32,
}

impl RateLimits {
    /// Minimum gap between requests
    pub fn delay_between_requests(&self) -> Duration {
        Duration::from_millis(self.delay_between_requests_ms)
    }
}

impl ModelSettings {
    /// Returns the API key or a configuration error naming where to set it
    ///
    /// A blank key counts as missing.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AnalyzerError::Config("GEMINI_API_KEY not configured".into()))
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-pro".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_seconds: 120,
        }
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            delay_between_requests_ms: 30_000,
            backoff_multiplier: 2,
            max_attempts: 2,
            jitter_ms: 0,
            requests_per_minute: 2,
            requests_per_day: 50,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("terms-analyzer").join("config.toml"))
    }

    /// Loads configuration from the default config file location
    ///
    /// Falls back to defaults when the file doesn't exist. Environment
    /// overrides are applied either way.
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::parse_file(&path)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Loads configuration from an explicit file, then applies environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut config = Self::parse_file(path)?;
        config.apply_env();
        Ok(config)
    }

    fn parse_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AnalyzerError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Applies `GEMINI_*` environment overrides
    pub fn apply_env(&mut self) {
        apply_overrides(&mut self.model, get_env_value);
    }

    /// Checks that the settings can drive a working pipeline
    pub fn validate(&self) -> Result<()> {
        if self.model.model.trim().is_empty() {
            return Err(AnalyzerError::Config("model name is empty".into()));
        }
        if self.model.endpoint.trim().is_empty() {
            return Err(AnalyzerError::Config("endpoint is empty".into()));
        }
        if self.rate_limits.max_attempts == 0 {
            return Err(AnalyzerError::Config("max_attempts must be at least 1".into()));
        }
        if self.rate_limits.backoff_multiplier == 0 {
            return Err(AnalyzerError::Config("backoff_multiplier must be at least 1".into()));
        }
        Ok(())
    }
}
