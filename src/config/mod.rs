//! Configuration management for scribe.
//!
//! TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! Scribe uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - Default values for optional settings
//! - Environment variable overrides (`SCRIBE_*` prefix)
//! - Type-safe configuration structs
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [extraction]
//! confidence_threshold = 0.5
//!
//! [validation]
//! remote_enabled = true
//! endpoint = "https://validator.example.com/fhir"
//! username = "scribe_user"
//! password = "${SCRIBE_VALIDATION_PASSWORD}"
//! ```
//!
//! Every section is optional; an empty file is a valid configuration
//! that extracts with built-in patterns and skips remote validation.

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::load_config;
pub use schema::{
    ApplicationConfig, ExtractionConfig, LoggingConfig, ScribeConfig, TerminologyConfig,
    ValidationConfig,
};
pub use secret::{secret_string, secret_string_opt, SecretString, SecretValue};
