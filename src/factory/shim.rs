//! Legacy adapter shim
//!
//! Thin per-record-type convenience functions for callers that hold
//! fully-qualified reference strings (e.g. "Patient/123") rather than
//! pipeline entities. Each function only assembles a [`BuildContext`]
//! and delegates to the registry; no mapping or ordering logic lives
//! here.

use super::FactoryRegistry;
use crate::domain::{
    BuildContext, CodedConcept, EntityKind, ExtractedEntity, LocalKey, Record, RecordRef, Result,
};

/// Build a medication-administration record for a known patient and
/// practitioner.
///
/// `concept` comes from the caller (typically via
/// [`TerminologyMapper::map_concept`](crate::terminology::TerminologyMapper::map_concept));
/// the shim performs no mapping of its own.
pub fn medication_administration_record(
    registry: &FactoryRegistry,
    key: LocalKey,
    medication_text: &str,
    concept: &CodedConcept,
    patient_reference: &str,
    practitioner_reference: Option<&str>,
) -> Result<Record> {
    let entity = synthetic_entity(EntityKind::Medication, medication_text);
    let mut ctx = BuildContext::with_subject(RecordRef::Concrete(patient_reference.to_string()));
    if let Some(practitioner) = practitioner_reference {
        ctx.requester = Some(RecordRef::Concrete(practitioner.to_string()));
    }
    registry.build("MedicationAdministration", key, &entity, concept, &ctx)
}

/// Build a medication-order record for a known patient
pub fn medication_request_record(
    registry: &FactoryRegistry,
    key: LocalKey,
    medication_text: &str,
    concept: &CodedConcept,
    patient_reference: &str,
) -> Result<Record> {
    let entity = synthetic_entity(EntityKind::Medication, medication_text);
    let ctx = BuildContext::with_subject(RecordRef::Concrete(patient_reference.to_string()));
    registry.build("MedicationRequest", key, &entity, concept, &ctx)
}

/// Build an observation record for a known patient
pub fn observation_record(
    registry: &FactoryRegistry,
    key: LocalKey,
    observation_text: &str,
    concept: &CodedConcept,
    patient_reference: &str,
) -> Result<Record> {
    let entity = synthetic_entity(EntityKind::Observation, observation_text);
    let ctx = BuildContext::with_subject(RecordRef::Concrete(patient_reference.to_string()));
    registry.build("Observation", key, &entity, concept, &ctx)
}

fn synthetic_entity(kind: EntityKind, text: &str) -> ExtractedEntity {
    ExtractedEntity::new(kind, text, 0, text.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SYSTEM_RXNORM;

    #[test]
    fn test_medication_administration_shim() {
        let registry = FactoryRegistry::with_default_builders();
        let concept = CodedConcept::mapped(SYSTEM_RXNORM, "7052", "morphine");

        let record = medication_administration_record(
            &registry,
            LocalKey::new("admin-1").unwrap(),
            "morphine",
            &concept,
            "Patient/123",
            Some("Practitioner/42"),
        )
        .unwrap();

        assert_eq!(record.record_type, "MedicationAdministration");
        assert_eq!(
            record.references["subject"],
            RecordRef::Concrete("Patient/123".to_string())
        );
        assert_eq!(
            record.fields["medicationCodeableConcept"]["coding"][0]["code"],
            "7052"
        );
    }

    #[test]
    fn test_shim_rejects_malformed_patient_reference() {
        let registry = FactoryRegistry::with_default_builders();
        let concept = CodedConcept::fallback("morphine");

        let result = medication_request_record(
            &registry,
            LocalKey::new("med-1").unwrap(),
            "morphine",
            &concept,
            "garbage",
        );
        assert!(result.is_err());
    }
}
