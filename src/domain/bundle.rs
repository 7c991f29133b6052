//! Transaction bundle model
//!
//! The assembled output document: entries in dependency order, each with
//! a bundle-scoped `urn:uuid:` identifier minted during assembly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::record::Record;

/// One entry in an assembled bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleEntry {
    /// Bundle-scoped internal identifier; stable for the life of the bundle
    pub internal_id: Uuid,
    /// The record behind this entry, references fully resolved
    pub record: Record,
}

impl BundleEntry {
    /// The `urn:uuid:` anchor reference for this entry
    pub fn full_url(&self) -> String {
        format!("urn:uuid:{}", self.internal_id)
    }

    /// Render this entry as FHIR bundle-entry JSON
    pub fn to_json(&self) -> Value {
        json!({
            "fullUrl": self.full_url(),
            "resource": self.record.to_resource(),
            "request": {
                "method": "POST",
                "url": self.record.record_type,
            },
        })
    }
}

/// A transaction bundle: entries in a valid topological order of the
/// record dependency graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bundle {
    /// Entries in emission order
    pub entries: Vec<BundleEntry>,
    /// Assembly timestamp
    pub timestamp: DateTime<Utc>,
}

impl Bundle {
    /// Create a bundle from ordered entries
    pub fn new(entries: Vec<BundleEntry>) -> Self {
        Self {
            entries,
            timestamp: Utc::now(),
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the bundle has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the entry index for an internal id
    pub fn index_of(&self, internal_id: &Uuid) -> Option<usize> {
        self.entries.iter().position(|e| &e.internal_id == internal_id)
    }

    /// Render the bundle as a FHIR transaction document
    pub fn to_json(&self) -> Value {
        json!({
            "resourceType": "Bundle",
            "type": "transaction",
            "timestamp": self.timestamp.to_rfc3339(),
            "entry": self.entries.iter().map(BundleEntry::to_json).collect::<Vec<_>>(),
        })
    }
}
