//! Domain models and types for scribe.
//!
//! This module contains the core domain models shared by every pipeline
//! stage: extracted entities, coded concepts, in-flight records with
//! tagged references, assembled bundles, and the error hierarchy.
//!
//! # Type Safety
//!
//! Identifiers use the newtype pattern and references are a tagged union,
//! so "is this a local key or an external id" is a type-safe match, never
//! a string prefix check:
//!
//! ```rust
//! use scribe::domain::{LocalKey, RecordRef};
//!
//! # fn example() -> Result<(), String> {
//! let subject = RecordRef::Local(LocalKey::new("patient-1")?);
//! match &subject {
//!     RecordRef::Local(key) => assert_eq!(key.as_str(), "patient-1"),
//!     RecordRef::Concrete(id) => println!("already resolved: {id}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, ScribeError>`](Result). An
//! unmapped terminology term is *not* an error — it is the free-text
//! fallback state of [`CodedConcept`].

pub mod bundle;
pub mod concept;
pub mod entity;
pub mod errors;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use bundle::{Bundle, BundleEntry};
pub use concept::{CodedConcept, SYSTEM_LOINC, SYSTEM_RXNORM, SYSTEM_SNOMED};
pub use entity::{EntityKind, ExtractedEntity};
pub use errors::{AssemblyError, BuilderError, ScribeError};
pub use record::{BuildContext, LocalKey, Record, RecordCategory, RecordRef};
pub use result::Result;
