//! Configuration schema types
//!
//! Defines the structure of the `scribe.toml` configuration file.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};

/// Main scribe configuration
///
/// This is the root structure that maps to the TOML file. Every section
/// has sensible defaults so an empty file is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScribeConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Entity extraction settings
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Terminology table overrides
    #[serde(default)]
    pub terminology: TerminologyConfig,

    /// Validation settings, including the optional remote validator
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ScribeConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value found.
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.extraction.validate()?;
        self.validation.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Entity extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Path to a TOML pattern library overriding the built-in rules
    #[serde(default)]
    pub pattern_library: Option<String>,

    /// Minimum confidence an extracted entity must carry to survive
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,
}

impl ExtractionConfig {
    fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(format!(
                "extraction.confidence_threshold must be between 0.0 and 1.0, got {}",
                self.confidence_threshold
            ));
        }
        Ok(())
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            pattern_library: None,
            confidence_threshold: default_confidence_threshold(),
        }
    }
}

/// Terminology table overrides
///
/// Each field replaces the corresponding built-in code table when set.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TerminologyConfig {
    /// Path to a TOML drug code table (RxNorm)
    #[serde(default)]
    pub drug_table: Option<String>,

    /// Path to a TOML clinical code table (SNOMED CT)
    #[serde(default)]
    pub clinical_table: Option<String>,

    /// Path to a TOML lab code table (LOINC)
    #[serde(default)]
    pub lab_table: Option<String>,
}

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Whether to submit assembled bundles to a remote validator
    #[serde(default)]
    pub remote_enabled: bool,

    /// Base URL of the remote validation server
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Request timeout in seconds; a timed-out remote check downgrades
    /// the remote status to unknown rather than failing the conversion
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Username for basic authentication (optional)
    #[serde(default)]
    pub username: Option<String>,

    /// Password for basic authentication (optional)
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default)]
    pub password: Option<SecretString>,
}

impl ValidationConfig {
    fn validate(&self) -> Result<(), String> {
        if self.remote_enabled {
            let endpoint = self.endpoint.as_deref().ok_or_else(|| {
                "validation.endpoint is required when remote_enabled is true".to_string()
            })?;
            let parsed = url::Url::parse(endpoint)
                .map_err(|e| format!("validation.endpoint is not a valid URL: {e}"))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err("validation.endpoint must use http or https".to_string());
            }
        }
        if self.timeout_seconds == 0 {
            return Err("validation.timeout_seconds must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            remote_enabled: false,
            endpoint: None,
            timeout_seconds: default_timeout_seconds(),
            username: None,
            password: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether to write JSON logs to a local rolling file
    #[serde(default)]
    pub file_enabled: bool,

    /// Directory for local log files
    #[serde(default = "default_log_path")]
    pub file_path: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.file_enabled && self.file_path.is_empty() {
            return Err("logging.file_path cannot be empty when file_enabled is true".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_enabled: false,
            file_path: default_log_path(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_confidence_threshold() -> f32 {
    0.5
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_log_path() -> String {
    "logs".to_string()
}
