//! Init command implementation
//!
//! This module implements the `init` command for generating a starter
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "scribe.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing scribe configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(3);
        }

        match fs::write(&self.output, Self::starter_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. To enable remote validation, set the endpoint and");
                println!("     SCRIBE_VALIDATION_PASSWORD in your environment");
                println!("  3. Validate configuration: scribe validate-config");
                println!("  4. Convert a narrative: scribe convert \"Patient: Jane Doe ...\"");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Starter configuration content
    fn starter_config() -> &'static str {
        r#"# Scribe Configuration File
# Clinical narrative to transaction bundle converter

[application]
log_level = "info"

[extraction]
# Path to a custom pattern library; omit to use the built-in rules
# pattern_library = "patterns/entity_patterns.toml"
confidence_threshold = 0.5

[terminology]
# Custom code tables; omit to use the built-in tables
# drug_table = "terminology/drug_codes.toml"
# clinical_table = "terminology/clinical_codes.toml"
# lab_table = "terminology/lab_codes.toml"

[validation]
remote_enabled = false
# endpoint = "https://validator.example.com/fhir"
# timeout_seconds = 10
# username = "scribe_user"
# password = "${SCRIBE_VALIDATION_PASSWORD}"

[logging]
file_enabled = false
file_path = "logs"
"#
    }
}
