//! Remote validation client
//!
//! Submits an assembled bundle to an external validation server and
//! maps its outcome report onto [`ValidationIssue`]s. The remote check
//! is advisory: an unreachable, slow, or erroring server downgrades the
//! remote status to unknown and never blocks the pipeline.

use crate::config::ValidationConfig;
use crate::domain::{Result, ScribeError};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::time::Duration;

use super::report::{IssueSeverity, IssueSource, RemoteStatus, ValidationIssue};

/// Outcome of one remote validation call
#[derive(Debug, Clone)]
pub struct RemoteOutcome {
    /// Overall remote status
    pub status: RemoteStatus,
    /// Issues reported by the server, entry indices resolved where the
    /// server named one
    pub issues: Vec<ValidationIssue>,
}

impl RemoteOutcome {
    /// The downgrade outcome used whenever the server gave no usable answer
    fn unknown(message: impl Into<String>) -> Self {
        Self {
            status: RemoteStatus::Unknown,
            issues: vec![ValidationIssue {
                severity: IssueSeverity::Warning,
                message: message.into(),
                entry_index: None,
                source: IssueSource::Remote,
                resolved: false,
            }],
        }
    }
}

/// Boundary trait for remote bundle validation
#[async_trait]
pub trait RemoteValidation: Send + Sync {
    /// Submit a bundle document and return the mapped outcome
    async fn validate_bundle(&self, bundle_json: &serde_json::Value) -> RemoteOutcome;
}

/// HTTP client for a remote validation server
///
/// Speaks the `$validate` operation: POST the bundle, receive an
/// OperationOutcome-style report with a severity-tagged issue list.
pub struct HttpValidator {
    endpoint: String,
    client: Client,
    username: Option<String>,
    password: Option<String>,
}

impl HttpValidator {
    /// Create a validator from configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if remote validation is enabled
    /// without an endpoint, or if the HTTP client cannot be built.
    pub fn from_config(config: &ValidationConfig) -> Result<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or_else(|| {
                ScribeError::Configuration(
                    "validation.endpoint is required for remote validation".to_string(),
                )
            })?;

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                ScribeError::Configuration(format!("Failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            endpoint,
            client,
            username: config.username.clone(),
            password: config
                .password
                .as_ref()
                .map(|p| p.expose_secret().as_ref().to_string()),
        })
    }

    /// Build the basic-auth header value, if credentials are configured
    fn auth_header_value(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => {
                let credentials = format!("{username}:{password}");
                let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
                Some(format!("Basic {encoded}"))
            }
            _ => None,
        }
    }

    /// Base URL of the validation server
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RemoteValidation for HttpValidator {
    async fn validate_bundle(&self, bundle_json: &serde_json::Value) -> RemoteOutcome {
        let url = format!("{}/Bundle/$validate", self.endpoint.trim_end_matches('/'));

        tracing::debug!(url = %url, "Submitting bundle for remote validation");

        let mut request = self.client.post(&url).json(bundle_json);
        if let Some(auth) = self.auth_header_value() {
            request = request.header("Authorization", auth);
        }

        let response = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    error = %e,
                    "Remote validator unreachable, downgrading to unknown"
                );
                return RemoteOutcome::unknown(format!("remote validator unreachable: {e}"));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(
                endpoint = %self.endpoint,
                status = %status,
                "Remote validator returned non-success status"
            );
            return RemoteOutcome::unknown(format!(
                "remote validator returned status {status}"
            ));
        }

        let outcome: OperationOutcome = match response.json().await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(error = %e, "Remote validator response was not parseable");
                return RemoteOutcome::unknown(format!("unparseable validator response: {e}"));
            }
        };

        map_outcome(outcome)
    }
}

/// Wire shape of the validator's outcome report
#[derive(Debug, Deserialize)]
struct OperationOutcome {
    #[serde(default)]
    issue: Vec<OutcomeIssue>,
}

#[derive(Debug, Deserialize)]
struct OutcomeIssue {
    severity: String,
    #[serde(default)]
    diagnostics: Option<String>,
    #[serde(default)]
    expression: Vec<String>,
}

/// Map the wire outcome onto report issues
fn map_outcome(outcome: OperationOutcome) -> RemoteOutcome {
    let mut issues = Vec::new();
    let mut failed = false;

    for issue in outcome.issue {
        let severity = match issue.severity.as_str() {
            "error" | "fatal" => {
                failed = true;
                IssueSeverity::Error
            }
            "warning" => IssueSeverity::Warning,
            _ => IssueSeverity::Information,
        };

        issues.push(ValidationIssue {
            severity,
            message: issue
                .diagnostics
                .unwrap_or_else(|| "no diagnostics provided".to_string()),
            entry_index: issue.expression.iter().find_map(|e| parse_entry_index(e)),
            source: IssueSource::Remote,
            resolved: false,
        });
    }

    RemoteOutcome {
        status: if failed {
            RemoteStatus::Failed
        } else {
            RemoteStatus::Passed
        },
        issues,
    }
}

/// Extract the entry index from an expression like `Bundle.entry[3]`
fn parse_entry_index(expression: &str) -> Option<usize> {
    let re = Regex::new(r"Bundle\.entry\[(\d+)\]").ok()?;
    re.captures(expression)?.get(1)?.as_str().parse().ok()
}
