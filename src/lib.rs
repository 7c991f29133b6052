// Scribe - Clinical Narrative to FHIR Transaction Bundle Converter
// Copyright (c) 2025 Scribe Contributors
// Licensed under the MIT License

//! # Scribe - Clinical Narrative to Transaction Bundle Converter
//!
//! Scribe converts unstructured clinical narrative text into a validated,
//! cross-referenced set of structured healthcare records packaged as a
//! single transaction bundle.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Extracting** typed, positioned entity candidates from narrative text
//! - **Mapping** normalized entity text against standard coded terminologies
//! - **Building** one structured record per identified concept
//! - **Assembling** records into a transaction bundle whose entry order
//!   respects data dependencies and whose internal references resolve
//! - **Validating** the bundle locally and, optionally, against a remote
//!   validation server, repairing failing entries in place
//!
//! ## Architecture
//!
//! Scribe follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - The conversion pipeline orchestrator
//! - [`extract`] - Pattern-based entity extraction
//! - [`terminology`] - Code table lookup and concept mapping
//! - [`factory`] - Record builders and the dispatch registry
//! - [`assemble`] - Dependency ordering and reference resolution
//! - [`validate`] - Local checks, remote validation, per-entry repair
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scribe::config::ScribeConfig;
//! use scribe::core::pipeline::ConversionPipeline;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScribeConfig::default();
//!     let pipeline = ConversionPipeline::from_config(&config)?;
//!
//!     let outcome = pipeline
//!         .convert("Patient: Jane Doe needs cisplatin 80mg IV daily", None)
//!         .await?;
//!
//!     println!("{}", outcome.bundle.to_json());
//!     println!("{}", outcome.report.format_summary());
//!     Ok(())
//! }
//! ```
//!
//! ## Degradation Model
//!
//! The pipeline never discards a whole bundle over one bad span of text:
//!
//! - Text no terminology table recognizes maps to a free-text concept,
//!   never a placeholder code
//! - A record that cannot be fully built degrades to its reduced form,
//!   which carries only what free text guarantees
//! - A bundle entry that fails validation is swapped for its reduced
//!   form in place; its internal id, and therefore every reference to
//!   it, survives the swap
//!
//! The only fatal pipeline error is a dependency cycle, which indicates
//! a defect in how dependency edges were declared.
//!
//! ## Error Handling
//!
//! Scribe uses the [`domain::ScribeError`] type for all errors:
//!
//! ```rust,no_run
//! use scribe::domain::ScribeError;
//!
//! fn example() -> Result<(), ScribeError> {
//!     let config = scribe::config::load_config("scribe.toml")?;
//!     Ok(())
//! }
//! ```

pub mod assemble;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod extract;
pub mod factory;
pub mod logging;
pub mod terminology;
pub mod validate;
