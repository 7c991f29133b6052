//! Regex-based entity extractor

use super::{patterns::PatternRegistry, EntityExtractor};
use crate::domain::{EntityKind, ExtractedEntity, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Regex-based entity extractor
///
/// Applies the pattern registry's rules in priority order, keeps every
/// non-overlapping occurrence per kind, and resolves overlapping matches
/// of the same kind by keeping the widest span.
pub struct RegexExtractor {
    registry: Arc<PatternRegistry>,
    confidence_threshold: f32,
}

impl RegexExtractor {
    /// Create an extractor with the built-in pattern library
    pub fn new() -> Result<Self> {
        let registry = PatternRegistry::default_patterns()?;
        Ok(Self {
            registry: Arc::new(registry),
            confidence_threshold: 0.5,
        })
    }

    /// Create an extractor with a custom pattern registry
    pub fn with_registry(registry: PatternRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            confidence_threshold: 0.5,
        }
    }

    /// Set the confidence threshold
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Collect every candidate span from every rule at or above the
    /// confidence threshold. When a rule has a capture group, the entity
    /// span is group 1; otherwise the whole match.
    fn collect_candidates(&self, text: &str) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for (rule_rank, pattern) in self.registry.all_patterns().iter().enumerate() {
            if pattern.confidence < self.confidence_threshold {
                continue;
            }

            for capture in pattern.regex.captures_iter(text) {
                let matched = match capture.get(1).or_else(|| capture.get(0)) {
                    Some(m) => m,
                    None => continue,
                };
                if matched.as_str().trim().is_empty() {
                    continue;
                }

                let entity = ExtractedEntity::new(
                    pattern.kind,
                    matched.as_str(),
                    matched.start(),
                    matched.end(),
                )
                .with_confidence(pattern.confidence);

                candidates.push(Candidate { entity, rule_rank });
            }
        }

        candidates
    }

    /// Within each kind, drop spans that overlap an already-kept span.
    /// Wider spans win; equal-width ties go to the higher-priority rule.
    fn dedup_overlaps(candidates: Vec<Candidate>) -> Vec<ExtractedEntity> {
        let mut by_kind: HashMap<EntityKind, Vec<Candidate>> = HashMap::new();
        for candidate in candidates {
            by_kind.entry(candidate.entity.kind).or_default().push(candidate);
        }

        let mut kept = Vec::new();
        for (_, mut group) in by_kind {
            group.sort_by(|a, b| {
                b.entity
                    .width()
                    .cmp(&a.entity.width())
                    .then(a.entity.start.cmp(&b.entity.start))
                    .then(a.rule_rank.cmp(&b.rule_rank))
            });

            let mut accepted: Vec<ExtractedEntity> = Vec::new();
            for candidate in group {
                let overlaps_kept = accepted.iter().any(|e| e.overlaps(&candidate.entity));
                if !overlaps_kept {
                    accepted.push(candidate.entity);
                }
            }
            kept.extend(accepted);
        }

        kept
    }
}

struct Candidate {
    entity: ExtractedEntity,
    rule_rank: usize,
}

impl EntityExtractor for RegexExtractor {
    fn extract(&self, text: &str) -> Vec<ExtractedEntity> {
        let candidates = self.collect_candidates(text);
        let mut entities = Self::dedup_overlaps(candidates);

        // Deterministic output order: source position, then kind, then
        // widest first for identical starts.
        entities.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(b.width().cmp(&a.width()))
                .then(a.kind.cmp(&b.kind))
        });

        entities
    }

    fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn extractor() -> RegexExtractor {
        RegexExtractor::new().unwrap()
    }

    fn kinds_of(entities: &[ExtractedEntity], kind: EntityKind) -> Vec<String> {
        entities
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.normalized_text.clone())
            .collect()
    }

    #[test]
    fn test_extract_patient_name() {
        let entities = extractor().extract("Patient: Jane Doe needs rest");
        let patients = kinds_of(&entities, EntityKind::Patient);
        assert_eq!(patients, vec!["jane doe"]);
    }

    #[test]
    fn test_patient_keeps_original_casing() {
        let entities = extractor().extract("Patient: Jane Doe");
        let patient = entities
            .iter()
            .find(|e| e.kind == EntityKind::Patient)
            .unwrap();
        assert_eq!(patient.raw_text, "Jane Doe");
    }

    #[test]
    fn test_multiple_medications_single_pass() {
        let text = "cisplatin 80mg/m² IV on day one, followed by carboplatin AUC 6 on day two";
        let entities = extractor().extract(text);
        let meds = kinds_of(&entities, EntityKind::Medication);
        assert_eq!(meds, vec!["cisplatin", "carboplatin"]);
    }

    #[test]
    fn test_multiple_lab_tests() {
        let entities = extractor().extract("order CBC and CMP before the next cycle");
        let labs = kinds_of(&entities, EntityKind::LabTest);
        assert_eq!(labs, vec!["cbc", "cmp"]);
    }

    #[test]
    fn test_overlapping_same_kind_keeps_widest() {
        // "foley catheter" and "catheter" both match; only the wider
        // span survives.
        let entities = extractor().extract("placed a foley catheter at bedside");
        let devices = kinds_of(&entities, EntityKind::Device);
        assert_eq!(devices, vec!["foley catheter"]);
    }

    #[test]
    fn test_cue_and_lexicon_overlap_deduped() {
        // "needs cisplatin" fires the cue rule and the lexicon rule on
        // the same span; exactly one Medication entity comes out.
        let entities = extractor().extract("Patient: Jane Doe needs cisplatin 80mg/m² IV daily");
        let meds = kinds_of(&entities, EntityKind::Medication);
        assert_eq!(meds, vec!["cisplatin"]);
    }

    #[test]
    fn test_unknown_medication_via_cue() {
        let entities = extractor().extract("give the patient zz-compound-9 now");
        let meds = kinds_of(&entities, EntityKind::Medication);
        assert_eq!(meds, vec!["zz-compound-9"]);
    }

    #[test]
    fn test_deterministic_output() {
        let text = "Patient: John Smith on metformin 500mg PO, order A1C and glucose, BP 130/85";
        let first = extractor().extract(text);
        let second = extractor().extract(text);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.kind, b.kind);
            assert_eq!(a.start, b.start);
            assert_eq!(a.end, b.end);
            assert_eq!(a.raw_text, b.raw_text);
        }
    }

    #[test]
    fn test_offsets_index_original_text() {
        let text = "Patient: Jane Doe needs cisplatin";
        let entities = extractor().extract(text);
        for entity in &entities {
            assert_eq!(&text[entity.start..entity.end], entity.raw_text);
        }
    }

    #[test]
    fn test_unmatched_text_yields_nothing() {
        let entities = extractor().extract("the quick brown fox jumps over the lazy dog");
        assert!(entities.is_empty());
    }

    #[test_case("80mg", "80mg"; "plain milligrams")]
    #[test_case("80mg/m²", "80mg/m²"; "body surface area")]
    #[test_case("2.5 mcg/kg", "2.5 mcg/kg"; "weight based")]
    #[test_case("AUC 6", "auc 6"; "auc dosing")]
    fn test_dosage_forms(input: &str, expected: &str) {
        let text = format!("cisplatin {input} IV");
        let entities = extractor().extract(&text);
        let doses = kinds_of(&entities, EntityKind::Dosage);
        assert_eq!(doses, vec![expected.to_lowercase()]);
    }

    #[test]
    fn test_route_and_vitals() {
        let entities = extractor().extract("morphine 2mg IV, BP 120/80, heart rate 72");
        assert_eq!(kinds_of(&entities, EntityKind::Route), vec!["iv"]);
        let observations = kinds_of(&entities, EntityKind::Observation);
        assert_eq!(observations, vec!["bp 120/80", "heart rate 72"]);
    }
}
