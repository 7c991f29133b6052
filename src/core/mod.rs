//! Core business logic for scribe.
//!
//! # Modules
//!
//! - [`pipeline`] - The conversion pipeline: extract, map, build,
//!   assemble, validate
//!
//! # Conversion Workflow
//!
//! The typical conversion workflow:
//!
//! 1. **Extract**: Scan the narrative for typed entity candidates
//! 2. **Plan**: Attach dosage and route mentions to their medication,
//!    pick the subject patient
//! 3. **Map**: Normalize each entity against the terminology tables
//! 4. **Build**: Construct one record per concept via the factory
//!    registry, degrading to the reduced form on structural failure
//! 5. **Assemble**: Order records by dependency and mint internal ids
//! 6. **Validate**: Run local checks, optionally the remote validator,
//!    and repair failing entries in place
//!
//! # Example
//!
//! ```rust,no_run
//! use scribe::config::ScribeConfig;
//! use scribe::core::pipeline::ConversionPipeline;
//!
//! # async fn example() -> scribe::domain::Result<()> {
//! let config = ScribeConfig::default();
//! let pipeline = ConversionPipeline::from_config(&config)?;
//!
//! let outcome = pipeline
//!     .convert("Patient: Jane Doe needs cisplatin 80mg IV daily", None)
//!     .await?;
//! println!("{}", outcome.bundle.to_json());
//! # Ok(())
//! # }
//! ```

pub mod pipeline;

pub use pipeline::{ConversionOutcome, ConversionPipeline};
