//! Validation orchestration
//!
//! Runs the local structural checks, optionally submits the bundle to a
//! remote validation server, and repairs failing entries in place by
//! swapping them for their reduced form. Recovery is per entry: one bad
//! entry never discards the rest of the bundle.

pub mod local;
pub mod remote;
pub mod report;

pub use local::LocalValidator;
pub use remote::{HttpValidator, RemoteOutcome, RemoteValidation};
pub use report::{
    IssueSeverity, IssueSource, RemoteStatus, ValidationIssue, ValidationReport,
};

use crate::domain::{BuildContext, Bundle};
use crate::factory::FactoryRegistry;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Coordinates local checks, the optional remote check, and repair
pub struct ValidationOrchestrator {
    local: LocalValidator,
    remote: Option<Arc<dyn RemoteValidation>>,
    registry: Arc<FactoryRegistry>,
}

impl ValidationOrchestrator {
    /// Orchestrator with local checks only
    pub fn new(registry: Arc<FactoryRegistry>) -> Self {
        Self {
            local: LocalValidator::new(),
            remote: None,
            registry,
        }
    }

    /// Attach a remote validator
    pub fn with_remote(mut self, remote: Arc<dyn RemoteValidation>) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Validate without repairing
    pub async fn validate(&self, bundle: &Bundle, request_id: Option<&str>) -> ValidationReport {
        let started = Instant::now();
        let mut report = ValidationReport::new(request_id.map(str::to_string));

        self.local.check_into_report(bundle, &mut report);

        if let Some(remote) = &self.remote {
            let outcome = remote.validate_bundle(&bundle.to_json()).await;
            report.remote_status = outcome.status;
            for issue in outcome.issues {
                report.record_issue(issue);
            }
        }

        report.set_duration(started.elapsed().as_millis() as u64);
        report
    }

    /// Validate and repair failing entries
    ///
    /// Any entry that fails the local checks, or that the remote
    /// validator rejects with an error naming its index, is replaced in
    /// place by the reduced form of the same record type. The entry's
    /// internal id survives the swap, so references from other entries
    /// stay correct without rewriting. Entries that still fail after
    /// repair are listed as unresolved; the bundle is returned
    /// regardless.
    pub async fn validate_and_repair(
        &self,
        mut bundle: Bundle,
        request_id: Option<&str>,
    ) -> (Bundle, ValidationReport) {
        let started = Instant::now();
        let mut report = ValidationReport::new(request_id.map(str::to_string));
        report.entries_checked = bundle.len();

        let mut issues = self.local.check(&bundle);
        let mut repaired: HashSet<usize> = HashSet::new();

        for issue in &mut issues {
            if issue.severity != IssueSeverity::Error {
                continue;
            }
            let Some(index) = issue.entry_index else {
                continue;
            };

            if repaired.contains(&index) || self.repair_entry(&mut bundle, index) {
                repaired.insert(index);
                issue.resolved = true;
                report.record_degraded(index);
            } else {
                report.record_unresolved(index);
            }
        }
        for issue in issues {
            report.record_issue(issue);
        }

        // Repaired entries must now satisfy the local checks; anything
        // still failing is beyond what the reduced form can fix.
        if !repaired.is_empty() {
            for issue in self.local.check(&bundle) {
                if issue.severity == IssueSeverity::Error {
                    if let Some(index) = issue.entry_index {
                        tracing::error!(
                            entry = index,
                            message = %issue.message,
                            "Entry still fails checks after repair"
                        );
                        report.record_unresolved(index);
                        report.record_issue(issue);
                    }
                }
            }
        }

        if let Some(remote) = &self.remote {
            let outcome = remote.validate_bundle(&bundle.to_json()).await;
            report.remote_status = outcome.status;

            for mut issue in outcome.issues {
                if issue.severity == IssueSeverity::Error {
                    match issue.entry_index {
                        Some(index) if !repaired.contains(&index) => {
                            if self.repair_entry(&mut bundle, index) {
                                repaired.insert(index);
                                issue.resolved = true;
                                report.record_degraded(index);
                            } else {
                                report.record_unresolved(index);
                            }
                        }
                        Some(index) => {
                            // Already in reduced form; nothing further
                            // to fall back to.
                            report.record_unresolved(index);
                        }
                        None => {}
                    }
                }
                report.record_issue(issue);
            }
        }

        report.set_duration(started.elapsed().as_millis() as u64);

        if report.is_degraded() {
            tracing::warn!(
                degraded = report.degraded_entries.len(),
                unresolved = report.unresolved_entries.len(),
                "Bundle returned in degraded form"
            );
        }

        (bundle, report)
    }

    /// Swap one entry for its reduced form, preserving the internal id
    ///
    /// Returns false when the entry has no source text to rebuild from
    /// or no builder is registered for its type.
    fn repair_entry(&self, bundle: &mut Bundle, index: usize) -> bool {
        let Some(entry) = bundle.entries.get_mut(index) else {
            return false;
        };

        let Some(text) = entry.record.source_text.clone() else {
            tracing::warn!(
                entry = index,
                record_type = %entry.record.record_type,
                "Cannot repair entry without source text"
            );
            return false;
        };

        // Carry over the already-resolved subject so the reduced record
        // keeps its patient link.
        let mut ctx = BuildContext::default();
        if let Some(subject) = entry.record.references.get("subject") {
            ctx.subject = Some(subject.clone());
        }

        match self.registry.build_reduced(
            &entry.record.record_type,
            entry.record.local_key.clone(),
            &text,
            &ctx,
        ) {
            Ok(reduced) => {
                tracing::info!(
                    entry = index,
                    record_type = %entry.record.record_type,
                    "Replaced entry with its reduced form"
                );
                entry.record = reduced;
                true
            }
            Err(e) => {
                tracing::error!(
                    entry = index,
                    error = %e,
                    "No reduced builder available for entry"
                );
                false
            }
        }
    }
}
