//! Coded terminology concepts
//!
//! A [`CodedConcept`] is either a real code drawn from a terminology table
//! or a pure free-text fallback. The two states are mutually exclusive:
//! an unmapped concept never carries a synthetic placeholder code.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Fixed system URI for drug codes (RxNorm)
pub const SYSTEM_RXNORM: &str = "http://www.nlm.nih.gov/research/umls/rxnorm";

/// Fixed system URI for clinical findings, procedures, routes and devices (SNOMED CT)
pub const SYSTEM_SNOMED: &str = "http://snomed.info/sct";

/// Fixed system URI for laboratory and vital-sign observations (LOINC)
pub const SYSTEM_LOINC: &str = "http://loinc.org";

/// A coded concept with a free-text fallback terminal state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodedConcept {
    /// Terminology system URI; empty for fallback concepts
    pub system: String,
    /// Code within the system; empty for fallback concepts
    pub code: String,
    /// Preferred display term; empty for fallback concepts
    pub display: String,
    /// Free text; carries the original surface string for fallbacks
    pub text: String,
}

impl CodedConcept {
    /// Create a mapped concept from a terminology table entry
    pub fn mapped(
        system: impl Into<String>,
        code: impl Into<String>,
        display: impl Into<String>,
    ) -> Self {
        let display = display.into();
        Self {
            system: system.into(),
            code: code.into(),
            text: display.clone(),
            display,
        }
    }

    /// Create a free-text fallback concept for an unmapped term.
    ///
    /// This is a valid terminal state, not an error.
    pub fn fallback(text: impl Into<String>) -> Self {
        Self {
            system: String::new(),
            code: String::new(),
            display: String::new(),
            text: text.into(),
        }
    }

    /// Whether this concept carries a real code
    pub fn is_mapped(&self) -> bool {
        !self.code.is_empty()
    }

    /// Well-formedness: a real code with a system, or a pure text fallback.
    ///
    /// A concept mixing an empty code with a non-empty system (or vice
    /// versa), or carrying neither code nor text, is malformed.
    pub fn is_well_formed(&self) -> bool {
        if self.is_mapped() {
            !self.system.is_empty()
        } else {
            self.system.is_empty() && self.display.is_empty() && !self.text.is_empty()
        }
    }

    /// Render as a FHIR CodeableConcept JSON value
    pub fn to_codeable_concept(&self) -> Value {
        if self.is_mapped() {
            json!({
                "coding": [{
                    "system": self.system,
                    "code": self.code,
                    "display": self.display,
                }],
                "text": self.text,
            })
        } else {
            json!({ "text": self.text })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapped_concept() {
        let concept = CodedConcept::mapped(SYSTEM_RXNORM, "2555", "cisplatin");
        assert!(concept.is_mapped());
        assert!(concept.is_well_formed());
        assert_eq!(concept.text, "cisplatin");
    }

    #[test]
    fn test_fallback_concept() {
        let concept = CodedConcept::fallback("zz-compound-9");
        assert!(!concept.is_mapped());
        assert!(concept.is_well_formed());
        assert_eq!(concept.code, "");
        assert_eq!(concept.text, "zz-compound-9");
    }

    #[test]
    fn test_mixed_state_is_malformed() {
        let concept = CodedConcept {
            system: String::new(),
            code: "unknown-xxx".to_string(),
            display: String::new(),
            text: "something".to_string(),
        };
        assert!(!concept.is_well_formed());
    }

    #[test]
    fn test_codeable_concept_shapes() {
        let mapped = CodedConcept::mapped(SYSTEM_LOINC, "718-7", "Hemoglobin");
        let value = mapped.to_codeable_concept();
        assert_eq!(value["coding"][0]["code"], "718-7");

        let fallback = CodedConcept::fallback("zz-compound-9");
        let value = fallback.to_codeable_concept();
        assert!(value.get("coding").is_none());
        assert_eq!(value["text"], "zz-compound-9");
    }
}
