//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::ScribeConfig;
use crate::config::secret_string;
use crate::domain::errors::ScribeError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into ScribeConfig
/// 4. Applies environment variable overrides (SCRIBE_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, TOML parsing fails, a
/// referenced environment variable is unset, or validation fails.
pub fn load_config(path: impl AsRef<Path>) -> Result<ScribeConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ScribeError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ScribeError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: ScribeConfig = toml::from_str(&contents)
        .map_err(|e| ScribeError::Configuration(format!("Failed to parse TOML: {e}")))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        ScribeError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched. A placeholder referencing an unset
/// variable is an error.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ScribeError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        // Skip comment lines, placeholders in comments are examples
        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ScribeError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the SCRIBE_* prefix
///
/// Variables follow the pattern SCRIBE_<SECTION>_<KEY>, for example
/// SCRIBE_VALIDATION_ENDPOINT or SCRIBE_APPLICATION_LOG_LEVEL.
fn apply_env_overrides(config: &mut ScribeConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("SCRIBE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Extraction overrides
    if let Ok(val) = std::env::var("SCRIBE_EXTRACTION_PATTERN_LIBRARY") {
        config.extraction.pattern_library = Some(val);
    }
    if let Ok(val) = std::env::var("SCRIBE_EXTRACTION_CONFIDENCE_THRESHOLD") {
        if let Ok(threshold) = val.parse() {
            config.extraction.confidence_threshold = threshold;
        }
    }

    // Terminology overrides
    if let Ok(val) = std::env::var("SCRIBE_TERMINOLOGY_DRUG_TABLE") {
        config.terminology.drug_table = Some(val);
    }
    if let Ok(val) = std::env::var("SCRIBE_TERMINOLOGY_CLINICAL_TABLE") {
        config.terminology.clinical_table = Some(val);
    }
    if let Ok(val) = std::env::var("SCRIBE_TERMINOLOGY_LAB_TABLE") {
        config.terminology.lab_table = Some(val);
    }

    // Validation overrides
    if let Ok(val) = std::env::var("SCRIBE_VALIDATION_REMOTE_ENABLED") {
        config.validation.remote_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("SCRIBE_VALIDATION_ENDPOINT") {
        config.validation.endpoint = Some(val);
    }
    if let Ok(val) = std::env::var("SCRIBE_VALIDATION_TIMEOUT_SECONDS") {
        if let Ok(timeout) = val.parse() {
            config.validation.timeout_seconds = timeout;
        }
    }
    if let Ok(val) = std::env::var("SCRIBE_VALIDATION_USERNAME") {
        config.validation.username = Some(val);
    }
    if let Ok(val) = std::env::var("SCRIBE_VALIDATION_PASSWORD") {
        config.validation.password = Some(secret_string(val));
    }

    // Logging overrides
    if let Ok(val) = std::env::var("SCRIBE_LOGGING_FILE_ENABLED") {
        config.logging.file_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("SCRIBE_LOGGING_FILE_PATH") {
        config.logging.file_path = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("SCRIBE_TEST_SUBST_VAR", "test_value");
        let input = "password = \"${SCRIBE_TEST_SUBST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "password = \"test_value\"\n");
        std::env::remove_var("SCRIBE_TEST_SUBST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("SCRIBE_TEST_MISSING_VAR");
        let input = "password = \"${SCRIBE_TEST_MISSING_VAR}\"";
        assert!(substitute_env_vars(input).is_err());
    }

    #[test]
    fn test_comment_lines_not_substituted() {
        let input = "# set ${NOT_A_REAL_VAR} to taste\nlevel = \"info\"";
        let result = substitute_env_vars(input).unwrap();
        assert!(result.contains("${NOT_A_REAL_VAR}"));
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(load_config("nonexistent.toml").is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
[application]
log_level = "debug"

[extraction]
confidence_threshold = 0.6

[validation]
remote_enabled = true
endpoint = "https://validator.example.com/fhir"
timeout_seconds = 5
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.extraction.confidence_threshold, 0.6);
        assert_eq!(
            config.validation.endpoint.as_deref(),
            Some("https://validator.example.com/fhir")
        );
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let toml_content = r#"
[validation]
remote_enabled = true
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        assert!(load_config(temp_file.path()).is_err());
    }
}
