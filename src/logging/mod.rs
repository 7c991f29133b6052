//! Logging and observability
//!
//! Structured logging with JSON-formatted file output, configurable
//! log levels, and console output for development.
//!
//! # Example
//!
//! ```no_run
//! use scribe::logging::init_logging;
//! use scribe::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of a conversion
///
/// # Example
///
/// ```no_run
/// use scribe::log_conversion_start;
///
/// log_conversion_start!("req-42", 180);
/// ```
#[macro_export]
macro_rules! log_conversion_start {
    ($request_id:expr, $text_len:expr) => {
        tracing::info!(
            request_id = %$request_id,
            text_len = $text_len,
            "Starting conversion"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use scribe::log_error_with_context;
/// use scribe::domain::ScribeError;
///
/// let error = ScribeError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_macros_compile() {
        // Macro expansion is checked at compile time; output is not
        // asserted here.
    }
}
