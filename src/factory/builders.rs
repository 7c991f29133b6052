//! Built-in record builders
//!
//! One builder per record type. Each full build copies entity data and
//! coded concepts into the record's field map; the reduced path emits
//! only what free text guarantees: a status, a `text`-only concept and
//! whatever valid references the caller supplied.

use super::Builder;
use crate::domain::{
    BuildContext, BuilderError, CodedConcept, ExtractedEntity, LocalKey, Record, RecordRef,
};
use serde_json::{json, Value};

/// All built-in builders
pub fn default_builders() -> Vec<Box<dyn Builder>> {
    vec![
        Box::new(PatientBuilder),
        Box::new(MedicationRequestBuilder),
        Box::new(MedicationAdministrationBuilder),
        Box::new(DeviceBuilder),
        Box::new(ServiceRequestBuilder),
        Box::new(ObservationBuilder),
        Box::new(ProcedureBuilder),
    ]
}

/// Check that a caller-supplied reference is structurally usable: a
/// local key, or a concrete id of the form "Type/id" or "urn:uuid:...".
fn check_reference(field: &str, reference: &RecordRef) -> Result<(), BuilderError> {
    match reference {
        RecordRef::Local(_) => Ok(()),
        RecordRef::Concrete(id) => {
            if !id.is_empty() && (id.contains('/') || id.starts_with("urn:uuid:")) {
                Ok(())
            } else {
                Err(BuilderError::UnresolvableReference {
                    field: field.to_string(),
                    value: id.clone(),
                })
            }
        }
    }
}

/// Attach the subject reference when present and valid; structural
/// invalidity is a build failure, not something to silently drop.
fn require_valid_subject(record: &mut Record, ctx: &BuildContext) -> Result<(), BuilderError> {
    if let Some(subject) = &ctx.subject {
        check_reference("subject", subject)?;
        record.set_reference("subject", subject.clone());
    }
    Ok(())
}

/// Reduced path: keep only references that are already structurally valid
fn keep_valid_subject(record: &mut Record, ctx: &BuildContext, field: &str) {
    if let Some(subject) = &ctx.subject {
        if check_reference(field, subject).is_ok() {
            record.set_reference(field, subject.clone());
        }
    }
}

fn dosage_instruction(ctx: &BuildContext) -> Option<Value> {
    if ctx.dosage_text.is_none() && ctx.route.is_none() {
        return None;
    }
    let mut dosage = serde_json::Map::new();
    if let Some(text) = &ctx.dosage_text {
        dosage.insert("text".to_string(), json!(text));
    }
    if let Some(route) = &ctx.route {
        dosage.insert("route".to_string(), route.to_codeable_concept());
    }
    Some(Value::Object(dosage))
}

/// Patient identity records
pub struct PatientBuilder;

impl Builder for PatientBuilder {
    fn record_type(&self) -> &'static str {
        "Patient"
    }

    fn build(
        &self,
        key: LocalKey,
        entity: &ExtractedEntity,
        _concept: &CodedConcept,
        _ctx: &BuildContext,
    ) -> Result<Record, BuilderError> {
        let name = entity.raw_text.trim();
        if name.is_empty() {
            return Err(BuilderError::InvalidInput(
                "Patient entity has no name text".to_string(),
            ));
        }

        let mut record = Record::new(self.record_type(), key);
        record.set_field("name", json!([human_name(name)]));
        record.set_source_text(&entity.raw_text);
        Ok(record)
    }

    fn build_reduced(&self, key: LocalKey, text: &str, _ctx: &BuildContext) -> Record {
        let mut record = Record::new(self.record_type(), key);
        let text = if text.trim().is_empty() {
            "Unknown patient"
        } else {
            text.trim()
        };
        record.set_field("name", json!([{ "text": text }]));
        record.set_source_text(text);
        record
    }
}

/// Split a name into a FHIR HumanName object, keeping original casing
fn human_name(name: &str) -> Value {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    if tokens.len() >= 2 {
        json!({
            "text": name,
            "given": tokens[..tokens.len() - 1],
            "family": tokens[tokens.len() - 1],
        })
    } else {
        json!({ "text": name })
    }
}

/// Medication order records
pub struct MedicationRequestBuilder;

impl Builder for MedicationRequestBuilder {
    fn record_type(&self) -> &'static str {
        "MedicationRequest"
    }

    fn build(
        &self,
        key: LocalKey,
        entity: &ExtractedEntity,
        concept: &CodedConcept,
        ctx: &BuildContext,
    ) -> Result<Record, BuilderError> {
        let mut record = Record::new(self.record_type(), key);
        record.set_field("status", json!(ctx.status.as_deref().unwrap_or("active")));
        record.set_field("intent", json!("order"));
        record.set_field(
            "medicationCodeableConcept",
            concept.to_codeable_concept(),
        );
        if let Some(dosage) = dosage_instruction(ctx) {
            record.set_field("dosageInstruction", json!([dosage]));
        }
        if let Some(authored) = &ctx.effective_time {
            record.set_field("authoredOn", json!(authored));
        }
        require_valid_subject(&mut record, ctx)?;
        if let Some(requester) = &ctx.requester {
            check_reference("requester", requester)?;
            record.set_reference("requester", requester.clone());
        }
        record.set_source_text(&entity.raw_text);
        Ok(record)
    }

    fn build_reduced(&self, key: LocalKey, text: &str, ctx: &BuildContext) -> Record {
        let mut record = Record::new(self.record_type(), key);
        record.set_field("status", json!("unknown"));
        record.set_field("intent", json!("order"));
        record.set_field(
            "medicationCodeableConcept",
            CodedConcept::fallback(text).to_codeable_concept(),
        );
        keep_valid_subject(&mut record, ctx, "subject");
        record.set_source_text(text);
        record
    }
}

/// Medication administration event records
pub struct MedicationAdministrationBuilder;

impl Builder for MedicationAdministrationBuilder {
    fn record_type(&self) -> &'static str {
        "MedicationAdministration"
    }

    fn build(
        &self,
        key: LocalKey,
        entity: &ExtractedEntity,
        concept: &CodedConcept,
        ctx: &BuildContext,
    ) -> Result<Record, BuilderError> {
        let mut record = Record::new(self.record_type(), key);
        record.set_field(
            "status",
            json!(ctx.status.as_deref().unwrap_or("completed")),
        );
        record.set_field(
            "medicationCodeableConcept",
            concept.to_codeable_concept(),
        );
        if let Some(effective) = &ctx.effective_time {
            record.set_field("effectiveDateTime", json!(effective));
        }
        if let Some(dosage) = dosage_instruction(ctx) {
            record.set_field("dosage", dosage);
        }
        require_valid_subject(&mut record, ctx)?;
        if let Some(performer) = &ctx.requester {
            check_reference("performer", performer)?;
            record.set_reference("performer", performer.clone());
        }
        if let Some(request) = &ctx.prior_order {
            check_reference("request", request)?;
            record.set_reference("request", request.clone());
        }
        record.set_source_text(&entity.raw_text);
        Ok(record)
    }

    fn build_reduced(&self, key: LocalKey, text: &str, ctx: &BuildContext) -> Record {
        let mut record = Record::new(self.record_type(), key);
        record.set_field("status", json!("unknown"));
        record.set_field(
            "medicationCodeableConcept",
            CodedConcept::fallback(text).to_codeable_concept(),
        );
        keep_valid_subject(&mut record, ctx, "subject");
        record.set_source_text(text);
        record
    }
}

/// Medical device records
pub struct DeviceBuilder;

impl Builder for DeviceBuilder {
    fn record_type(&self) -> &'static str {
        "Device"
    }

    fn build(
        &self,
        key: LocalKey,
        entity: &ExtractedEntity,
        concept: &CodedConcept,
        ctx: &BuildContext,
    ) -> Result<Record, BuilderError> {
        let mut record = Record::new(self.record_type(), key);
        record.set_field("status", json!(ctx.status.as_deref().unwrap_or("active")));
        record.set_field("type", concept.to_codeable_concept());
        if let Some(subject) = &ctx.subject {
            check_reference("patient", subject)?;
            record.set_reference("patient", subject.clone());
        }
        record.set_source_text(&entity.raw_text);
        Ok(record)
    }

    fn build_reduced(&self, key: LocalKey, text: &str, ctx: &BuildContext) -> Record {
        let mut record = Record::new(self.record_type(), key);
        record.set_field("status", json!("unknown"));
        record.set_field("type", CodedConcept::fallback(text).to_codeable_concept());
        keep_valid_subject(&mut record, ctx, "patient");
        record.set_source_text(text);
        record
    }
}

/// Laboratory order records
pub struct ServiceRequestBuilder;

impl Builder for ServiceRequestBuilder {
    fn record_type(&self) -> &'static str {
        "ServiceRequest"
    }

    fn build(
        &self,
        key: LocalKey,
        entity: &ExtractedEntity,
        concept: &CodedConcept,
        ctx: &BuildContext,
    ) -> Result<Record, BuilderError> {
        let mut record = Record::new(self.record_type(), key);
        record.set_field("status", json!(ctx.status.as_deref().unwrap_or("active")));
        record.set_field("intent", json!("order"));
        record.set_field("code", concept.to_codeable_concept());
        if let Some(authored) = &ctx.effective_time {
            record.set_field("authoredOn", json!(authored));
        }
        require_valid_subject(&mut record, ctx)?;
        if let Some(requester) = &ctx.requester {
            check_reference("requester", requester)?;
            record.set_reference("requester", requester.clone());
        }
        record.set_source_text(&entity.raw_text);
        Ok(record)
    }

    fn build_reduced(&self, key: LocalKey, text: &str, ctx: &BuildContext) -> Record {
        let mut record = Record::new(self.record_type(), key);
        record.set_field("status", json!("unknown"));
        record.set_field("intent", json!("order"));
        record.set_field("code", CodedConcept::fallback(text).to_codeable_concept());
        keep_valid_subject(&mut record, ctx, "subject");
        record.set_source_text(text);
        record
    }
}

/// Observation records (vitals and results)
pub struct ObservationBuilder;

impl Builder for ObservationBuilder {
    fn record_type(&self) -> &'static str {
        "Observation"
    }

    fn build(
        &self,
        key: LocalKey,
        entity: &ExtractedEntity,
        concept: &CodedConcept,
        ctx: &BuildContext,
    ) -> Result<Record, BuilderError> {
        let mut record = Record::new(self.record_type(), key);
        record.set_field("status", json!(ctx.status.as_deref().unwrap_or("final")));
        record.set_field("code", concept.to_codeable_concept());
        record.set_field("valueString", json!(entity.raw_text));
        if let Some(effective) = &ctx.effective_time {
            record.set_field("effectiveDateTime", json!(effective));
        }
        require_valid_subject(&mut record, ctx)?;
        record.set_source_text(&entity.raw_text);
        Ok(record)
    }

    fn build_reduced(&self, key: LocalKey, text: &str, ctx: &BuildContext) -> Record {
        let mut record = Record::new(self.record_type(), key);
        record.set_field("status", json!("unknown"));
        record.set_field("code", CodedConcept::fallback(text).to_codeable_concept());
        record.set_field("valueString", json!(text));
        keep_valid_subject(&mut record, ctx, "subject");
        record.set_source_text(text);
        record
    }
}

/// Procedure records
pub struct ProcedureBuilder;

impl Builder for ProcedureBuilder {
    fn record_type(&self) -> &'static str {
        "Procedure"
    }

    fn build(
        &self,
        key: LocalKey,
        entity: &ExtractedEntity,
        concept: &CodedConcept,
        ctx: &BuildContext,
    ) -> Result<Record, BuilderError> {
        let mut record = Record::new(self.record_type(), key);
        record.set_field(
            "status",
            json!(ctx.status.as_deref().unwrap_or("completed")),
        );
        record.set_field("code", concept.to_codeable_concept());
        if let Some(effective) = &ctx.effective_time {
            record.set_field("performedDateTime", json!(effective));
        }
        require_valid_subject(&mut record, ctx)?;
        record.set_source_text(&entity.raw_text);
        Ok(record)
    }

    fn build_reduced(&self, key: LocalKey, text: &str, ctx: &BuildContext) -> Record {
        let mut record = Record::new(self.record_type(), key);
        record.set_field("status", json!("unknown"));
        record.set_field("code", CodedConcept::fallback(text).to_codeable_concept());
        keep_valid_subject(&mut record, ctx, "subject");
        record.set_source_text(text);
        record
    }
}
