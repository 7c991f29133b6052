//! Local structural checks
//!
//! Always-run, no-network validation of an assembled bundle: required
//! fields per record type, reference resolvability, and coded-concept
//! well-formedness.

use crate::domain::{Bundle, RecordRef};
use serde_json::Value;

use super::report::{ValidationIssue, ValidationReport};

/// Required plain fields per record type
///
/// A record type absent from this table has no required-field check.
fn required_fields(record_type: &str) -> &'static [&'static str] {
    match record_type {
        "Patient" => &["name"],
        "MedicationRequest" => &["status", "intent", "medicationCodeableConcept"],
        "MedicationAdministration" => &["status", "medicationCodeableConcept"],
        "ServiceRequest" => &["status", "intent", "code"],
        "Observation" => &["status", "code"],
        "Procedure" => &["status", "code"],
        "Device" => &["type"],
        _ => &[],
    }
}

/// Fields that must hold a well-formed codeable concept when present
const CONCEPT_FIELDS: &[&str] = &["medicationCodeableConcept", "code", "type", "route"];

/// Performs the local structural checks
///
/// Stateless; shared freely across concurrent validations.
pub struct LocalValidator;

impl LocalValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check every entry and return the findings; never fails
    pub fn check(&self, bundle: &Bundle) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let urls: Vec<String> = bundle
            .entries
            .iter()
            .map(|e| e.full_url())
            .collect();

        for (index, entry) in bundle.entries.iter().enumerate() {
            let record = &entry.record;

            for field in required_fields(&record.record_type) {
                let present = match record.fields.get(*field) {
                    Some(Value::Null) | None => false,
                    Some(Value::String(s)) => !s.is_empty(),
                    Some(_) => true,
                };
                if !present {
                    issues.push(ValidationIssue::local_error(
                        index,
                        format!(
                            "{} is missing required field '{}'",
                            record.record_type, field
                        ),
                    ));
                }
            }

            for field in CONCEPT_FIELDS {
                if let Some(value) = record.fields.get(*field) {
                    if !is_well_formed_concept(value) {
                        issues.push(ValidationIssue::local_error(
                            index,
                            format!(
                                "{} field '{}' is neither coded nor text",
                                record.record_type, field
                            ),
                        ));
                    }
                }
            }

            for (field, reference) in &record.references {
                match reference {
                    RecordRef::Local(key) => {
                        issues.push(ValidationIssue::local_error(
                            index,
                            format!("reference '{field}' was never resolved (local key '{key}')"),
                        ));
                    }
                    RecordRef::Concrete(id) => {
                        if id.starts_with("urn:uuid:") {
                            match urls.iter().position(|u| u == id) {
                                Some(target) if target <= index => {}
                                Some(_) => {
                                    issues.push(ValidationIssue::local_error(
                                        index,
                                        format!(
                                            "reference '{field}' points at a later entry ({id})"
                                        ),
                                    ));
                                }
                                None => {
                                    issues.push(ValidationIssue::local_error(
                                        index,
                                        format!(
                                            "reference '{field}' targets no entry in this bundle ({id})"
                                        ),
                                    ));
                                }
                            }
                        } else if !id.contains('/') {
                            issues.push(ValidationIssue::local_error(
                                index,
                                format!("reference '{field}' is not a valid identifier ({id})"),
                            ));
                        }
                    }
                }
            }
        }

        issues
    }

    /// Run the checks and fold them into a fresh report
    pub fn check_into_report(&self, bundle: &Bundle, report: &mut ValidationReport) {
        report.entries_checked = bundle.len();
        for issue in self.check(bundle) {
            report.record_issue(issue);
        }
    }
}

impl Default for LocalValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// A codeable concept is well-formed when it carries at least one coding
/// with a system and code, or a non-empty text fallback
fn is_well_formed_concept(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };

    if let Some(codings) = obj.get("coding").and_then(Value::as_array) {
        let coded = codings.iter().any(|c| {
            let system = c.get("system").and_then(Value::as_str).unwrap_or("");
            let code = c.get("code").and_then(Value::as_str).unwrap_or("");
            !system.is_empty() && !code.is_empty()
        });
        if coded {
            return true;
        }
    }

    obj.get("text")
        .and_then(Value::as_str)
        .map(|t| !t.is_empty())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bundle, BundleEntry, LocalKey, Record};
    use serde_json::json;
    use uuid::Uuid;

    fn entry(record: Record) -> BundleEntry {
        BundleEntry {
            internal_id: Uuid::new_v4(),
            record,
        }
    }

    fn patient() -> Record {
        let mut r = Record::new("Patient", LocalKey::new("patient-1").unwrap());
        r.set_field("name", json!([{"text": "Jane Doe"}]));
        r
    }

    #[test]
    fn test_complete_bundle_has_no_findings() {
        let mut obs = Record::new("Observation", LocalKey::new("obs-1").unwrap());
        obs.set_field("status", json!("final"));
        obs.set_field("code", json!({"text": "blood pressure"}));

        let bundle = Bundle::new(vec![entry(patient()), entry(obs)]);
        assert!(LocalValidator::new().check(&bundle).is_empty());
    }

    #[test]
    fn test_missing_required_field_reported() {
        let obs = Record::new("Observation", LocalKey::new("obs-1").unwrap());
        let bundle = Bundle::new(vec![entry(obs)]);

        let issues = LocalValidator::new().check(&bundle);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().any(|i| i.message.contains("'status'")));
        assert!(issues.iter().any(|i| i.message.contains("'code'")));
    }

    #[test]
    fn test_malformed_concept_reported() {
        let mut obs = Record::new("Observation", LocalKey::new("obs-1").unwrap());
        obs.set_field("status", json!("final"));
        // A coding with no code and no text fallback is malformed.
        obs.set_field("code", json!({"coding": [{"system": "http://loinc.org"}]}));

        let issues = LocalValidator::new().check(&bundle_of(obs));
        assert!(issues
            .iter()
            .any(|i| i.message.contains("neither coded nor text")));
    }

    #[test]
    fn test_forward_reference_reported() {
        let p = entry(patient());
        let patient_url = p.full_url();

        let mut obs = Record::new("Observation", LocalKey::new("obs-1").unwrap());
        obs.set_field("status", json!("final"));
        obs.set_field("code", json!({"text": "bp"}));
        obs.set_reference("subject", RecordRef::Concrete(patient_url));
        let o = entry(obs);

        // Observation placed before the patient it references.
        let bundle = Bundle::new(vec![o, p]);
        let issues = LocalValidator::new().check(&bundle);
        assert!(issues.iter().any(|i| i.message.contains("later entry")));
    }

    #[test]
    fn test_unresolved_local_reference_reported() {
        let mut obs = Record::new("Observation", LocalKey::new("obs-1").unwrap());
        obs.set_field("status", json!("final"));
        obs.set_field("code", json!({"text": "bp"}));
        obs.set_reference("subject", RecordRef::Local(LocalKey::new("ghost").unwrap()));

        let issues = LocalValidator::new().check(&bundle_of(obs));
        assert!(issues.iter().any(|i| i.message.contains("never resolved")));
    }

    #[test]
    fn test_external_reference_accepted() {
        let mut obs = Record::new("Observation", LocalKey::new("obs-1").unwrap());
        obs.set_field("status", json!("final"));
        obs.set_field("code", json!({"text": "bp"}));
        obs.set_reference(
            "performer",
            RecordRef::Concrete("Practitioner/42".to_string()),
        );

        assert!(LocalValidator::new().check(&bundle_of(obs)).is_empty());
    }

    fn bundle_of(record: Record) -> Bundle {
        Bundle::new(vec![entry(record)])
    }
}
