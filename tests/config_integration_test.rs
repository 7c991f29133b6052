//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables should be run with --test-threads=1
//! to avoid interference between tests.

use scribe::config::load_config;
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("SCRIBE_APPLICATION_LOG_LEVEL");
    std::env::remove_var("SCRIBE_EXTRACTION_CONFIDENCE_THRESHOLD");
    std::env::remove_var("SCRIBE_VALIDATION_ENDPOINT");
    std::env::remove_var("SCRIBE_VALIDATION_TIMEOUT_SECONDS");
    std::env::remove_var("SCRIBE_VALIDATION_PASSWORD");
    std::env::remove_var("TEST_VALIDATOR_PASSWORD");
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let toml_content = r#"
[application]
log_level = "debug"

[extraction]
pattern_library = "patterns/custom_patterns.toml"
confidence_threshold = 0.7

[terminology]
drug_table = "terminology/site_drugs.toml"

[validation]
remote_enabled = true
endpoint = "https://validator.example.com/fhir"
timeout_seconds = 30
username = "scribe_user"
password = "hunter2"

[logging]
file_enabled = true
file_path = "/tmp/scribe-logs"
"#;

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "debug");

    assert_eq!(
        config.extraction.pattern_library.as_deref(),
        Some("patterns/custom_patterns.toml")
    );
    assert_eq!(config.extraction.confidence_threshold, 0.7);

    assert_eq!(
        config.terminology.drug_table.as_deref(),
        Some("terminology/site_drugs.toml")
    );
    assert!(config.terminology.clinical_table.is_none());

    assert!(config.validation.remote_enabled);
    assert_eq!(
        config.validation.endpoint.as_deref(),
        Some("https://validator.example.com/fhir")
    );
    assert_eq!(config.validation.timeout_seconds, 30);
    assert_eq!(config.validation.username.as_deref(), Some("scribe_user"));
    let password = config.validation.password.as_ref().unwrap();
    assert_eq!(password.expose_secret().as_ref(), "hunter2");

    assert!(config.logging.file_enabled);
    assert_eq!(config.logging.file_path, "/tmp/scribe-logs");
}

#[test]
fn test_empty_config_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"").unwrap();
    temp_file.flush().unwrap();

    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "info");
    assert!(config.extraction.pattern_library.is_none());
    assert_eq!(config.extraction.confidence_threshold, 0.5);
    assert!(!config.validation.remote_enabled);
    assert_eq!(config.validation.timeout_seconds, 10);
    assert!(!config.logging.file_enabled);
    assert_eq!(config.logging.file_path, "logs");
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_VALIDATOR_PASSWORD", "secret_pass");

    let toml_content = r#"
[validation]
remote_enabled = true
endpoint = "https://validator.example.com/fhir"
username = "user"
password = "${TEST_VALIDATOR_PASSWORD}"
"#;

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = load_config(temp_file.path()).expect("Failed to load config");

    let password = config.validation.password.as_ref().unwrap();
    assert_eq!(password.expose_secret().as_ref(), "secret_pass");

    std::env::remove_var("TEST_VALIDATOR_PASSWORD");
}

#[test]
fn test_missing_substitution_variable_is_an_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let toml_content = r#"
[validation]
remote_enabled = true
endpoint = "https://validator.example.com/fhir"
password = "${TEST_VALIDATOR_PASSWORD}"
"#;

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    assert!(load_config(temp_file.path()).is_err());
}

#[test]
fn test_env_var_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("SCRIBE_APPLICATION_LOG_LEVEL", "trace");
    std::env::set_var("SCRIBE_EXTRACTION_CONFIDENCE_THRESHOLD", "0.9");
    std::env::set_var("SCRIBE_VALIDATION_TIMEOUT_SECONDS", "3");

    let toml_content = r#"
[application]
log_level = "info"

[extraction]
confidence_threshold = 0.5

[validation]
timeout_seconds = 10
"#;

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = load_config(temp_file.path()).expect("Failed to load config");

    assert_eq!(config.application.log_level, "trace");
    assert_eq!(config.extraction.confidence_threshold, 0.9);
    assert_eq!(config.validation.timeout_seconds, 3);

    cleanup_env_vars();
}

#[test]
fn test_invalid_config_validation() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    // Remote validation enabled but no endpoint configured.
    let toml_content = r#"
[validation]
remote_enabled = true
"#;

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let result = load_config(temp_file.path());
    assert!(result.is_err());
}

#[test]
fn test_non_http_endpoint_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let toml_content = r#"
[validation]
remote_enabled = true
endpoint = "ftp://validator.example.com/fhir"
"#;

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    assert!(load_config(temp_file.path()).is_err());
}
