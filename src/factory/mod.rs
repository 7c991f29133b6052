//! Record construction
//!
//! A [`FactoryRegistry`] dispatches a logical record-type name to a
//! [`Builder`]. Every builder implements the same two-tier contract: a
//! primary `build` that may fail only on structurally impossible input,
//! and an always-available `build_reduced` that emits the minimal record
//! derivable from free text. The registry's
//! [`build_with_fallback`](FactoryRegistry::build_with_fallback) selects
//! between the two — the universal failure-recovery strategy, not a
//! per-type exception handler.
//!
//! The registry is constructed once at startup and injected; there is no
//! lazy process-wide singleton.

pub mod builders;
pub mod shim;

pub use builders::default_builders;

use crate::domain::{
    BuildContext, BuilderError, CodedConcept, ExtractedEntity, LocalKey, Record, Result,
    ScribeError,
};
use std::collections::HashMap;

/// Record builder contract
///
/// Builders are pure: the same inputs always produce the same record
/// shape. They read references from the caller-supplied context and
/// never mint references themselves.
pub trait Builder: Send + Sync {
    /// The record type this builder produces, e.g. "MedicationRequest"
    fn record_type(&self) -> &'static str;

    /// Build the full record.
    ///
    /// May fail only on structurally impossible input, such as a
    /// reference that is neither a valid external id nor a local key.
    fn build(
        &self,
        key: LocalKey,
        entity: &ExtractedEntity,
        concept: &CodedConcept,
        ctx: &BuildContext,
    ) -> std::result::Result<Record, BuilderError>;

    /// Build the reduced record: only the fields guaranteed to be
    /// derivable from free text. Never fails.
    fn build_reduced(&self, key: LocalKey, text: &str, ctx: &BuildContext) -> Record;
}

impl std::fmt::Debug for dyn Builder + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder")
            .field("record_type", &self.record_type())
            .finish()
    }
}

/// Dispatch table from record-type name to builder
pub struct FactoryRegistry {
    builders: HashMap<&'static str, Box<dyn Builder>>,
}

impl FactoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            builders: HashMap::new(),
        }
    }

    /// Create a registry with all built-in record builders
    pub fn with_default_builders() -> Self {
        let mut registry = Self::new();
        for builder in default_builders() {
            registry.register(builder);
        }
        registry
    }

    /// Register a builder under its record type
    pub fn register(&mut self, builder: Box<dyn Builder>) {
        self.builders.insert(builder.record_type(), builder);
    }

    /// Look up the builder for a record type.
    ///
    /// A miss is a configuration error: the registry was wired without a
    /// builder the pipeline expects, which is fatal, not per-request.
    pub fn builder(&self, record_type: &str) -> Result<&dyn Builder> {
        self.builders
            .get(record_type)
            .map(|b| b.as_ref())
            .ok_or_else(|| {
                ScribeError::Configuration(format!(
                    "No builder registered for record type '{record_type}'"
                ))
            })
    }

    /// Build a full record via the builder for `record_type`
    pub fn build(
        &self,
        record_type: &str,
        key: LocalKey,
        entity: &ExtractedEntity,
        concept: &CodedConcept,
        ctx: &BuildContext,
    ) -> Result<Record> {
        let builder = self.builder(record_type)?;
        builder
            .build(key, entity, concept, ctx)
            .map_err(ScribeError::from)
    }

    /// Build a record, degrading to the reduced path on structural
    /// failure.
    ///
    /// Returns the record and whether it was degraded. Only a registry
    /// lookup miss propagates as an error.
    pub fn build_with_fallback(
        &self,
        record_type: &str,
        key: LocalKey,
        entity: &ExtractedEntity,
        concept: &CodedConcept,
        ctx: &BuildContext,
    ) -> Result<(Record, bool)> {
        let builder = self.builder(record_type)?;
        match builder.build(key.clone(), entity, concept, ctx) {
            Ok(record) => Ok((record, false)),
            Err(e) => {
                tracing::warn!(
                    record_type = record_type,
                    local_key = %key,
                    error = %e,
                    "Builder failed structurally, degrading to reduced record"
                );
                Ok((builder.build_reduced(key, &entity.raw_text, ctx), true))
            }
        }
    }

    /// Build the reduced record directly (used by validation repair)
    pub fn build_reduced(
        &self,
        record_type: &str,
        key: LocalKey,
        text: &str,
        ctx: &BuildContext,
    ) -> Result<Record> {
        Ok(self.builder(record_type)?.build_reduced(key, text, ctx))
    }

    /// Registered record types, sorted
    pub fn record_types(&self) -> Vec<&'static str> {
        let mut types: Vec<_> = self.builders.keys().copied().collect();
        types.sort_unstable();
        types
    }
}

impl Default for FactoryRegistry {
    fn default() -> Self {
        Self::with_default_builders()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntityKind;

    #[test]
    fn test_default_registry_covers_pipeline_types() {
        let registry = FactoryRegistry::with_default_builders();
        for record_type in [
            "Patient",
            "MedicationRequest",
            "MedicationAdministration",
            "Device",
            "ServiceRequest",
            "Observation",
            "Procedure",
        ] {
            assert!(registry.builder(record_type).is_ok(), "{record_type}");
        }
    }

    #[test]
    fn test_unknown_record_type_is_configuration_error() {
        let registry = FactoryRegistry::with_default_builders();
        let err = registry.builder("Spaceship").unwrap_err();
        assert!(matches!(err, ScribeError::Configuration(_)));
    }

    #[test]
    fn test_build_with_fallback_degrades() {
        let registry = FactoryRegistry::with_default_builders();
        let entity = ExtractedEntity::new(EntityKind::Medication, "cisplatin", 0, 9);
        let concept = CodedConcept::fallback("cisplatin");

        // An empty concrete subject reference is structurally invalid.
        let ctx = BuildContext::with_subject(crate::domain::RecordRef::Concrete(String::new()));
        let (record, degraded) = registry
            .build_with_fallback(
                "MedicationRequest",
                LocalKey::new("med-1").unwrap(),
                &entity,
                &concept,
                &ctx,
            )
            .unwrap();

        assert!(degraded);
        assert_eq!(record.record_type, "MedicationRequest");
        assert!(record.fields.contains_key("status"));
    }
}
