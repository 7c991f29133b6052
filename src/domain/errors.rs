//! Domain error types
//!
//! The error hierarchy for scribe. All errors are domain-specific and
//! don't expose third-party types. Note what is deliberately *not* here:
//! an unmapped terminology term and a recoverable builder failure are not
//! errors at all — the first degrades to a free-text concept, the second
//! to the reduced construction path.

use thiserror::Error;

use super::record::LocalKey;

/// Main scribe error type
#[derive(Debug, Error)]
pub enum ScribeError {
    /// Configuration errors, including factory registry lookup misses
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Pattern library errors (invalid regex, unknown entity kind)
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Terminology table errors (malformed table file)
    #[error("Terminology error: {0}")]
    Terminology(String),

    /// Structural builder errors that escaped local recovery
    #[error("Builder error: {0}")]
    Builder(#[from] BuilderError),

    /// Bundle assembly errors; a dependency cycle is fatal
    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),

    /// Local validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Structural failures during record construction
///
/// A builder may fail only on structurally impossible input; the registry
/// recovers locally via the reduced construction path, so these rarely
/// propagate.
#[derive(Debug, Error)]
pub enum BuilderError {
    /// A reference field was neither a valid external id nor a known local key
    #[error("Unresolvable reference in field '{field}': {value}")]
    UnresolvableReference { field: String, value: String },

    /// Required context was missing for this record type
    #[error("Missing build context: {0}")]
    MissingContext(String),

    /// Entity input was structurally unusable for this record type
    #[error("Invalid entity input: {0}")]
    InvalidInput(String),
}

/// Bundle assembly failures
///
/// All of these are fatal: no partial bundle is ever returned.
#[derive(Debug, Error)]
pub enum AssemblyError {
    /// The dependency graph contains a cycle; this indicates a logic
    /// defect in how edges were declared, not bad input data
    #[error("Dependency cycle among records: {keys:?}")]
    DependencyCycle { keys: Vec<LocalKey> },

    /// A reference points at a local key no record declares
    #[error("Dangling reference from '{from}' field '{field}' to unknown key '{target}'")]
    DanglingReference {
        from: LocalKey,
        field: String,
        target: LocalKey,
    },

    /// Two records declared the same local key
    #[error("Duplicate local key: {0}")]
    DuplicateLocalKey(LocalKey),
}

// Conversion from std::io::Error
impl From<std::io::Error> for ScribeError {
    fn from(err: std::io::Error) -> Self {
        ScribeError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ScribeError {
    fn from(err: serde_json::Error) -> Self {
        ScribeError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ScribeError {
    fn from(err: toml::de::Error) -> Self {
        ScribeError::Configuration(format!("TOML parse error: {err}"))
    }
}
