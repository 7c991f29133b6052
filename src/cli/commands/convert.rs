//! Convert command implementation
//!
//! Reads a clinical narrative from an argument, a file, or stdin, runs
//! the conversion pipeline, and writes the bundle document to stdout or
//! a file.

use crate::config::load_config;
use crate::core::pipeline::ConversionPipeline;
use clap::Args;
use std::fs;
use std::io::Read;

/// Arguments for the convert command
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Narrative text to convert; omit to read from --file or stdin
    pub text: Option<String>,

    /// Read the narrative from a file instead of the command line
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<String>,

    /// Write the bundle document to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Pretty-print the bundle JSON
    #[arg(long)]
    pub pretty: bool,

    /// Print the validation report summary to stderr
    #[arg(long)]
    pub report: bool,

    /// Correlation id recorded in logs and the validation report
    #[arg(long)]
    pub request_id: Option<String>,
}

impl ConvertArgs {
    /// Execute the convert command
    ///
    /// Exit codes: 0 on a clean bundle, 2 when entries were degraded or
    /// left unresolved, 3 on configuration errors, 5 on fatal errors.
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load configuration: {e}");
                return Ok(3);
            }
        };

        let text = match self.read_narrative() {
            Ok(t) => t,
            Err(e) => {
                eprintln!("❌ Failed to read narrative: {e}");
                return Ok(5);
            }
        };
        if text.trim().is_empty() {
            eprintln!("❌ Narrative is empty");
            return Ok(5);
        }

        let pipeline = match ConversionPipeline::from_config(&config) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("❌ Failed to build pipeline: {e}");
                return Ok(3);
            }
        };

        let outcome = match pipeline.convert(&text, self.request_id.as_deref()).await {
            Ok(outcome) => outcome,
            Err(e) => {
                eprintln!("❌ Conversion failed: {e}");
                return Ok(5);
            }
        };

        let doc = outcome.bundle.to_json();
        let rendered = if self.pretty {
            serde_json::to_string_pretty(&doc)?
        } else {
            serde_json::to_string(&doc)?
        };

        match &self.output {
            Some(path) => {
                fs::write(path, &rendered)?;
                eprintln!("✅ Bundle written to {path}");
            }
            None => println!("{rendered}"),
        }

        if self.report {
            eprintln!("{}", outcome.report.format_summary());
        }

        if outcome.report.is_degraded() {
            Ok(2)
        } else {
            Ok(0)
        }
    }

    /// Read the narrative from the argument, the file, or stdin
    fn read_narrative(&self) -> anyhow::Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        if let Some(path) = &self.file {
            return Ok(fs::read_to_string(path)?);
        }
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    }
}
