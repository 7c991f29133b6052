//! Conversion pipeline - main orchestrator for narrative conversion
//!
//! This module coordinates the whole conversion: entity extraction,
//! terminology mapping, record construction, bundle assembly, and
//! validation with per-entry repair. One pipeline instance is
//! constructed at startup and shared across requests; every stage is
//! read-only after construction.

use crate::assemble::BundleAssembler;
use crate::config::ScribeConfig;
use crate::domain::{
    BuildContext, Bundle, EntityKind, ExtractedEntity, LocalKey, Record, RecordRef, Result,
    ScribeError,
};
use crate::extract::{EntityExtractor, PatternRegistry, RegexExtractor};
use crate::factory::FactoryRegistry;
use crate::terminology::TerminologyMapper;
use crate::validate::{HttpValidator, ValidationOrchestrator, ValidationReport};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Result of one conversion: the bundle, the validation report, and the
/// entities the bundle was derived from
#[derive(Debug)]
pub struct ConversionOutcome {
    /// The assembled, validated (possibly repaired) bundle
    pub bundle: Bundle,
    /// Validation findings and degradation bookkeeping
    pub report: ValidationReport,
    /// Entities extracted from the narrative, in source order
    pub entities: Vec<ExtractedEntity>,
}

/// Conversion pipeline
pub struct ConversionPipeline {
    extractor: Box<dyn EntityExtractor>,
    mapper: TerminologyMapper,
    registry: Arc<FactoryRegistry>,
    assembler: BundleAssembler,
    orchestrator: ValidationOrchestrator,
}

impl ConversionPipeline {
    /// Create a pipeline from configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a custom pattern library or
    /// terminology table cannot be loaded, or if remote validation is
    /// enabled with an unusable endpoint.
    pub fn from_config(config: &ScribeConfig) -> Result<Self> {
        let registry = match &config.extraction.pattern_library {
            Some(path) => PatternRegistry::from_file(path)?,
            None => PatternRegistry::default_patterns()?,
        };
        let extractor = RegexExtractor::with_registry(registry)
            .with_confidence_threshold(config.extraction.confidence_threshold);

        let mapper = TerminologyMapper::with_overrides(
            config.terminology.drug_table.as_deref(),
            config.terminology.clinical_table.as_deref(),
            config.terminology.lab_table.as_deref(),
        )?;

        let registry = Arc::new(FactoryRegistry::with_default_builders());

        let mut orchestrator = ValidationOrchestrator::new(registry.clone());
        if config.validation.remote_enabled {
            let remote = HttpValidator::from_config(&config.validation)?;
            tracing::info!(endpoint = remote.endpoint(), "Remote validation enabled");
            orchestrator = orchestrator.with_remote(Arc::new(remote));
        }

        Ok(Self {
            extractor: Box::new(extractor),
            mapper,
            registry,
            assembler: BundleAssembler::new(),
            orchestrator,
        })
    }

    /// Create a pipeline with explicit stages; used by tests and by
    /// callers that wire their own extractor or registry
    pub fn new(
        extractor: Box<dyn EntityExtractor>,
        mapper: TerminologyMapper,
        registry: Arc<FactoryRegistry>,
        orchestrator: ValidationOrchestrator,
    ) -> Self {
        Self {
            extractor,
            mapper,
            registry,
            assembler: BundleAssembler::new(),
            orchestrator,
        }
    }

    /// Convert one clinical narrative into a validated bundle
    ///
    /// Never returns an error for unrecognized text: narrative that
    /// yields no entities produces an empty bundle with a clean report.
    /// The only fatal outcomes are configuration defects surfaced by
    /// the factory registry and dependency cycles during assembly.
    pub async fn convert(
        &self,
        text: &str,
        request_id: Option<&str>,
    ) -> Result<ConversionOutcome> {
        let started = Instant::now();

        let entities = self.extractor.extract(text);
        tracing::debug!(
            request_id = request_id.unwrap_or("-"),
            entity_count = entities.len(),
            "Extracted entities"
        );

        let records = self.plan_records(&entities)?;
        let bundle = self.assembler.assemble(records)?;
        let (bundle, report) = self
            .orchestrator
            .validate_and_repair(bundle, request_id)
            .await;

        tracing::info!(
            request_id = request_id.unwrap_or("-"),
            entries = bundle.len(),
            errors = report.error_count(),
            degraded = report.degraded_entries.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Conversion complete"
        );

        Ok(ConversionOutcome {
            bundle,
            report,
            entities,
        })
    }

    /// Turn the entity list into records with dependency edges
    ///
    /// The first patient entity becomes the subject of every other
    /// record. Dosage and route mentions are not records of their own;
    /// each attaches to the nearest medication mention preceding it in
    /// the text.
    fn plan_records(&self, entities: &[ExtractedEntity]) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        let mut counters: HashMap<&'static str, usize> = HashMap::new();
        let mut subject: Option<RecordRef> = None;

        // Medication context gathered in a first pass so dosage and
        // route are in hand when the medication record is built.
        let med_context = attach_medication_context(entities);

        for (position, entity) in entities.iter().enumerate() {
            if !entity.kind.produces_record() {
                continue;
            }
            if entity.kind == EntityKind::Patient && subject.is_some() {
                // Coreference across mentions is out of scope; later
                // patient mentions are dropped.
                tracing::debug!(text = %entity.raw_text, "Ignoring repeated patient mention");
                continue;
            }

            let record_type = record_type_for(entity.kind);
            let key = next_key(&mut counters, record_type)?;

            let mut ctx = match &subject {
                Some(subject) => BuildContext::with_subject(subject.clone()),
                None => BuildContext::default(),
            };
            if entity.kind == EntityKind::Medication {
                if let Some(attached) = med_context.get(&position) {
                    ctx.dosage_text = attached.dosage.clone();
                    ctx.route = attached
                        .route
                        .as_ref()
                        .map(|r| self.mapper.map_concept(EntityKind::Route, r));
                }
            }

            let concept = self.mapper.map_concept(entity.kind, &entity.normalized_text);
            let (record, degraded) =
                self.registry
                    .build_with_fallback(record_type, key, entity, &concept, &ctx)?;
            if degraded {
                tracing::warn!(
                    record_type = record_type,
                    text = %entity.raw_text,
                    "Record built in reduced form"
                );
            }

            if entity.kind == EntityKind::Patient {
                subject = Some(RecordRef::Local(record.local_key.clone()));
            }
            records.push(record);
        }

        Ok(records)
    }
}

/// Dosage and route text attached to one medication mention
#[derive(Debug, Default)]
struct MedicationContext {
    dosage: Option<String>,
    route: Option<String>,
}

/// Attach each dosage/route entity to the nearest preceding medication
///
/// Keys are positions in the entity slice; only medication positions
/// appear in the result.
fn attach_medication_context(entities: &[ExtractedEntity]) -> HashMap<usize, MedicationContext> {
    let mut contexts: HashMap<usize, MedicationContext> = HashMap::new();
    let mut current_med: Option<usize> = None;

    for (position, entity) in entities.iter().enumerate() {
        match entity.kind {
            EntityKind::Medication => {
                current_med = Some(position);
            }
            EntityKind::Dosage => {
                if let Some(med) = current_med {
                    let ctx = contexts.entry(med).or_default();
                    if ctx.dosage.is_none() {
                        ctx.dosage = Some(entity.raw_text.clone());
                    }
                }
            }
            EntityKind::Route => {
                if let Some(med) = current_med {
                    let ctx = contexts.entry(med).or_default();
                    if ctx.route.is_none() {
                        ctx.route = Some(entity.normalized_text.clone());
                    }
                }
            }
            _ => {}
        }
    }

    contexts
}

/// Target record type for an entity kind
fn record_type_for(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Patient => "Patient",
        EntityKind::Medication => "MedicationRequest",
        EntityKind::LabTest => "ServiceRequest",
        EntityKind::Observation => "Observation",
        EntityKind::Device => "Device",
        EntityKind::Procedure => "Procedure",
        // Handled by produces_record() before dispatch.
        EntityKind::Dosage | EntityKind::Route => "",
    }
}

/// Mint the next local key for a record type, e.g. "medicationrequest-2"
fn next_key(counters: &mut HashMap<&'static str, usize>, record_type: &'static str) -> Result<LocalKey> {
    let counter = counters.entry(record_type).or_insert(0);
    *counter += 1;
    LocalKey::new(format!("{}-{}", record_type.to_lowercase(), counter))
        .map_err(ScribeError::Other)
}
