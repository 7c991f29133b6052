//! Entity extraction
//!
//! Turns raw clinical narrative into typed, positioned entity candidates.
//! Extraction never fails on well-formed UTF-8 input; text no rule
//! recognizes simply yields no candidates.
//!
//! # Example
//!
//! ```
//! use scribe::extract::{EntityExtractor, RegexExtractor};
//!
//! # fn example() -> scribe::domain::Result<()> {
//! let extractor = RegexExtractor::new()?;
//! let entities = extractor.extract("Patient: Jane Doe needs cisplatin 80mg IV");
//! assert!(!entities.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod patterns;
pub mod regex;

pub use patterns::{CompiledPattern, PatternRegistry};
pub use regex::RegexExtractor;

use crate::domain::ExtractedEntity;

/// Entity extractor contract
///
/// Implementations must be deterministic: the same text always yields
/// the same entity list (order, offsets and text).
pub trait EntityExtractor: Send + Sync {
    /// Extract all entity candidates from the text
    fn extract(&self, text: &str) -> Vec<ExtractedEntity>;

    /// Minimum rule confidence considered during extraction
    fn confidence_threshold(&self) -> f32;
}
