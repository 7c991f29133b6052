//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the scribe configuration file.

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates after parsing, so a successful load is
        // a valid configuration.
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(3);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!(
            "  Pattern Library: {}",
            config
                .extraction
                .pattern_library
                .as_deref()
                .unwrap_or("built-in")
        );
        println!(
            "  Confidence Threshold: {}",
            config.extraction.confidence_threshold
        );
        println!(
            "  Remote Validation: {}",
            if config.validation.remote_enabled {
                config.validation.endpoint.as_deref().unwrap_or("enabled")
            } else {
                "disabled"
            }
        );
        println!(
            "  File Logging: {}",
            if config.logging.file_enabled {
                config.logging.file_path.as_str()
            } else {
                "disabled"
            }
        );
        println!();
        Ok(0)
    }
}
