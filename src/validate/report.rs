//! Validation report structures
//!
//! This module defines the structures for reporting validation results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    /// The entry is structurally invalid and needs repair
    Error,
    /// The entry is usable but questionable
    Warning,
    /// Informational only
    Information,
}

/// Where an issue was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSource {
    /// Found by the local structural checks
    Local,
    /// Reported by the remote validation server
    Remote,
}

/// Outcome of the optional remote validation call
///
/// Unavailability of the remote validator is never an error; it
/// downgrades the status to [`RemoteStatus::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStatus {
    /// The remote validator accepted the bundle with no error issues
    Passed,
    /// The remote validator reported at least one error issue
    Failed,
    /// The remote validator was unreachable, timed out, or returned a
    /// non-success status
    Unknown,
    /// Remote validation is not configured
    Skipped,
}

/// One validation finding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// How serious the finding is
    pub severity: IssueSeverity,

    /// Human-readable description
    pub message: String,

    /// Bundle entry index the finding refers to, if it names one
    pub entry_index: Option<usize>,

    /// Which check produced the finding
    pub source: IssueSource,

    /// Whether the per-entry repair resolved this finding
    pub resolved: bool,
}

impl ValidationIssue {
    /// A local error finding for a specific entry
    pub fn local_error(entry_index: usize, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            message: message.into(),
            entry_index: Some(entry_index),
            source: IssueSource::Local,
            resolved: false,
        }
    }

    /// A local warning finding for a specific entry
    pub fn local_warning(entry_index: usize, message: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Warning,
            message: message.into(),
            entry_index: Some(entry_index),
            source: IssueSource::Local,
            resolved: false,
        }
    }
}

/// Validation report for one assembled bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Correlation id supplied by the caller, if any
    pub request_id: Option<String>,

    /// When validation started
    pub validated_at: DateTime<Utc>,

    /// Number of bundle entries checked
    pub entries_checked: usize,

    /// All findings, local and remote
    pub issues: Vec<ValidationIssue>,

    /// Outcome of the remote validation call
    pub remote_status: RemoteStatus,

    /// Entry indices replaced with their reduced form during repair
    pub degraded_entries: Vec<usize>,

    /// Entry indices that still fail after repair
    pub unresolved_entries: Vec<usize>,

    /// Duration of validation in milliseconds
    pub duration_ms: u64,
}

impl ValidationReport {
    /// Create an empty report
    pub fn new(request_id: Option<String>) -> Self {
        Self {
            request_id,
            validated_at: Utc::now(),
            entries_checked: 0,
            issues: Vec::new(),
            remote_status: RemoteStatus::Skipped,
            degraded_entries: Vec::new(),
            unresolved_entries: Vec::new(),
            duration_ms: 0,
        }
    }

    /// Record a finding
    pub fn record_issue(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Record that an entry was replaced with its reduced form
    pub fn record_degraded(&mut self, entry_index: usize) {
        if !self.degraded_entries.contains(&entry_index) {
            self.degraded_entries.push(entry_index);
        }
    }

    /// Record that an entry could not be repaired
    pub fn record_unresolved(&mut self, entry_index: usize) {
        if !self.unresolved_entries.contains(&entry_index) {
            self.unresolved_entries.push(entry_index);
        }
    }

    /// Set the duration of validation
    pub fn set_duration(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
    }

    /// Number of unresolved error findings
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Error && !i.resolved)
            .count()
    }

    /// Number of warning findings
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Warning)
            .count()
    }

    /// Whether validation found nothing wrong and nothing was degraded
    pub fn is_clean(&self) -> bool {
        self.error_count() == 0
            && self.degraded_entries.is_empty()
            && self.unresolved_entries.is_empty()
    }

    /// Whether the bundle was returned in degraded or partially
    /// unresolved form
    pub fn is_degraded(&self) -> bool {
        !self.degraded_entries.is_empty() || !self.unresolved_entries.is_empty()
    }

    /// Format the report as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str("📊 Validation Report\n");
        if let Some(ref id) = self.request_id {
            summary.push_str(&format!("  Request: {id}\n"));
        }
        summary.push_str(&format!("  Validated at: {}\n", self.validated_at));
        summary.push_str(&format!("  Duration: {} ms\n", self.duration_ms));
        summary.push_str(&format!("  Entries checked: {}\n", self.entries_checked));
        summary.push_str(&format!("  Remote status: {:?}\n", self.remote_status));
        summary.push_str(&format!("  ❌ Errors: {}\n", self.error_count()));
        summary.push_str(&format!("  ⚠️  Warnings: {}\n", self.warning_count()));
        summary.push_str(&format!(
            "  🩹 Degraded entries: {}\n",
            self.degraded_entries.len()
        ));
        summary.push_str(&format!(
            "  ⛔ Unresolved entries: {}\n",
            self.unresolved_entries.len()
        ));

        if !self.issues.is_empty() {
            summary.push_str("\nFindings:\n");
            for (i, issue) in self.issues.iter().enumerate() {
                let entry = issue
                    .entry_index
                    .map(|idx| format!("entry {idx}"))
                    .unwrap_or_else(|| "bundle".to_string());
                let state = if issue.resolved { " (resolved)" } else { "" };
                summary.push_str(&format!(
                    "  {}. [{:?}/{:?}] {}: {}{}\n",
                    i + 1,
                    issue.severity,
                    issue.source,
                    entry,
                    issue.message,
                    state
                ));
            }
        }

        summary
    }
}
