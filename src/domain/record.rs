//! In-flight record model
//!
//! A [`Record`] is one structured unit headed for a bundle. Before
//! assembly, records reference each other through pipeline-scoped
//! [`LocalKey`]s; assembly resolves those into `urn:uuid:` references.
//! Reference fields use the tagged union [`RecordRef`] so resolution is a
//! type-safe match rather than string prefix-sniffing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::concept::CodedConcept;

/// Pipeline-scoped temporary key identifying an in-flight record
///
/// Local keys exist only to express dependency edges before assembly;
/// they are not the final bundle identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocalKey(String);

impl LocalKey {
    /// Creates a new LocalKey from a string
    pub fn new(key: impl Into<String>) -> Result<Self, String> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err("Local key cannot be empty".to_string());
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LocalKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for LocalKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A reference from one record to another
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RecordRef {
    /// An already-resolved external identifier, e.g. "Patient/123" or a
    /// `urn:uuid:` reference minted during assembly
    Concrete(String),
    /// A local key pointing at another in-flight record
    Local(LocalKey),
}

impl RecordRef {
    /// The local key, if this is an in-flight reference
    pub fn local_key(&self) -> Option<&LocalKey> {
        match self {
            Self::Local(key) => Some(key),
            Self::Concrete(_) => None,
        }
    }

    /// Render as a FHIR Reference JSON value; only valid for concrete refs
    pub fn as_reference_value(&self) -> Option<Value> {
        match self {
            Self::Concrete(id) => Some(serde_json::json!({ "reference": id })),
            Self::Local(_) => None,
        }
    }
}

/// Declared ordering category; identity records come first, then orders
/// and requests, then administration/device events, then observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordCategory {
    /// Identity records (Patient)
    Identity,
    /// Orders and requests (MedicationRequest, ServiceRequest)
    Request,
    /// Administration, device and procedure events
    Event,
    /// Observations
    Observation,
}

impl RecordCategory {
    /// Category precedence for a record type name
    pub fn for_record_type(record_type: &str) -> Self {
        match record_type {
            "Patient" | "Practitioner" => Self::Identity,
            "MedicationRequest" | "ServiceRequest" => Self::Request,
            "MedicationAdministration" | "Device" | "Procedure" => Self::Event,
            "Observation" => Self::Observation,
            _ => Self::Event,
        }
    }
}

/// One structured unit conforming to a named schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Schema name, e.g. "MedicationRequest"
    pub record_type: String,
    /// Pipeline-scoped key used to express dependency edges
    pub local_key: LocalKey,
    /// Non-reference resource fields
    pub fields: Map<String, Value>,
    /// Reference fields keyed by field name; ordered for determinism
    pub references: BTreeMap<String, RecordRef>,
    /// Source text the record was derived from; used by the reduced
    /// construction path during repair
    pub source_text: Option<String>,
}

impl Record {
    /// Create an empty record of the given type
    pub fn new(record_type: impl Into<String>, local_key: LocalKey) -> Self {
        Self {
            record_type: record_type.into(),
            local_key,
            fields: Map::new(),
            references: BTreeMap::new(),
            source_text: None,
        }
    }

    /// Set a plain field value
    pub fn set_field(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Set a reference field
    pub fn set_reference(&mut self, name: impl Into<String>, reference: RecordRef) -> &mut Self {
        self.references.insert(name.into(), reference);
        self
    }

    /// Set the source text used by the reduced construction path
    pub fn set_source_text(&mut self, text: impl Into<String>) -> &mut Self {
        self.source_text = Some(text.into());
        self
    }

    /// Ordering category of this record
    pub fn category(&self) -> RecordCategory {
        RecordCategory::for_record_type(&self.record_type)
    }

    /// Local keys of the records this record depends on
    pub fn dependencies(&self) -> impl Iterator<Item = &LocalKey> {
        self.references.values().filter_map(RecordRef::local_key)
    }

    /// Render the record as a FHIR resource JSON object.
    ///
    /// All references must be concrete by this point; in-flight local
    /// references are skipped (assembly guarantees none remain).
    pub fn to_resource(&self) -> Value {
        let mut resource = Map::new();
        resource.insert(
            "resourceType".to_string(),
            Value::String(self.record_type.clone()),
        );
        for (name, value) in &self.fields {
            resource.insert(name.clone(), value.clone());
        }
        for (name, reference) in &self.references {
            if let Some(value) = reference.as_reference_value() {
                resource.insert(name.clone(), value);
            }
        }
        Value::Object(resource)
    }
}

/// Caller-supplied context for record construction
///
/// Carries references that are already resolved by the caller plus
/// optional clinical context. Builders read from this; they never mint
/// references themselves.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    /// Reference to the enclosing patient, if one was identified
    pub subject: Option<RecordRef>,
    /// Reference to the ordering practitioner, if known
    pub requester: Option<RecordRef>,
    /// Reference to a prior order this record fulfils (e.g. an
    /// administration pointing at its MedicationRequest)
    pub prior_order: Option<RecordRef>,
    /// Record status; builders fall back to a type-appropriate default
    pub status: Option<String>,
    /// Clinical timestamp, RFC 3339
    pub effective_time: Option<String>,
    /// Dosage free text attached to a medication mention
    pub dosage_text: Option<String>,
    /// Route concept attached to a medication mention
    pub route: Option<CodedConcept>,
}

impl BuildContext {
    /// Context with just a subject reference
    pub fn with_subject(subject: RecordRef) -> Self {
        Self {
            subject: Some(subject),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_key_rejects_empty() {
        assert!(LocalKey::new("").is_err());
        assert!(LocalKey::new("  ").is_err());
        assert!(LocalKey::new("patient-1").is_ok());
    }

    #[test]
    fn test_record_ref_local_key() {
        let local = RecordRef::Local(LocalKey::new("patient-1").unwrap());
        let concrete = RecordRef::Concrete("Patient/123".to_string());
        assert!(local.local_key().is_some());
        assert!(concrete.local_key().is_none());
    }

    #[test]
    fn test_category_precedence() {
        assert!(RecordCategory::Identity < RecordCategory::Request);
        assert!(RecordCategory::Request < RecordCategory::Event);
        assert!(RecordCategory::Event < RecordCategory::Observation);
        assert_eq!(
            RecordCategory::for_record_type("Patient"),
            RecordCategory::Identity
        );
        assert_eq!(
            RecordCategory::for_record_type("MedicationRequest"),
            RecordCategory::Request
        );
        assert_eq!(
            RecordCategory::for_record_type("Observation"),
            RecordCategory::Observation
        );
    }

    #[test]
    fn test_dependencies_only_local() {
        let mut record = Record::new("Observation", LocalKey::new("obs-1").unwrap());
        record.set_reference(
            "subject",
            RecordRef::Local(LocalKey::new("patient-1").unwrap()),
        );
        record.set_reference(
            "performer",
            RecordRef::Concrete("Practitioner/42".to_string()),
        );

        let deps: Vec<_> = record.dependencies().map(LocalKey::as_str).collect();
        assert_eq!(deps, vec!["patient-1"]);
    }

    #[test]
    fn test_to_resource_skips_unresolved_references() {
        let mut record = Record::new("Observation", LocalKey::new("obs-1").unwrap());
        record.set_field("status", Value::String("final".to_string()));
        record.set_reference(
            "subject",
            RecordRef::Local(LocalKey::new("patient-1").unwrap()),
        );

        let resource = record.to_resource();
        assert_eq!(resource["resourceType"], "Observation");
        assert_eq!(resource["status"], "final");
        assert!(resource.get("subject").is_none());
    }
}
