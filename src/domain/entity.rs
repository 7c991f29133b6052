//! Extracted entity data models

use serde::{Deserialize, Serialize};

/// Entity kind enumeration covering the clinically meaningful span types
/// scribe recognizes in narrative text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    /// Patient identity (name anchored to a cue such as "Patient:")
    Patient,
    /// Medication mention (lexicon match or cue-anchored token)
    Medication,
    /// Dose quantity ("80mg/m²", "AUC 6")
    Dosage,
    /// Route of administration ("IV", "oral")
    Route,
    /// Medical device ("infusion pump", "PICC line")
    Device,
    /// Laboratory test or panel ("CBC", "creatinine")
    LabTest,
    /// Vital-sign observation ("BP 120/80")
    Observation,
    /// Clinical procedure ("colonoscopy", "dialysis")
    Procedure,
}

impl EntityKind {
    /// Get human-readable label for the kind
    pub fn label(&self) -> &'static str {
        match self {
            Self::Patient => "PATIENT",
            Self::Medication => "MEDICATION",
            Self::Dosage => "DOSAGE",
            Self::Route => "ROUTE",
            Self::Device => "DEVICE",
            Self::LabTest => "LAB_TEST",
            Self::Observation => "OBSERVATION",
            Self::Procedure => "PROCEDURE",
        }
    }

    /// Whether entities of this kind become standalone records.
    ///
    /// Dosage and Route spans enrich the medication they belong to instead
    /// of producing a record of their own.
    pub fn produces_record(&self) -> bool {
        !matches!(self, Self::Dosage | Self::Route)
    }
}

/// A typed, positioned entity candidate produced by the extractor.
///
/// Offsets index into the *original* text; `raw_text` keeps the original
/// casing while `normalized_text` is the lowercased, whitespace-trimmed
/// form used for terminology lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    /// Kind of entity
    pub kind: EntityKind,
    /// Matched text with original casing
    pub raw_text: String,
    /// Lowercased, trimmed form for terminology lookup
    pub normalized_text: String,
    /// Byte offset of the span start in the source text
    pub start: usize,
    /// Byte offset one past the span end in the source text
    pub end: usize,
    /// Confidence score (0.0 - 1.0) inherited from the matching rule
    pub confidence: f32,
}

impl ExtractedEntity {
    /// Create a new entity from a matched span
    pub fn new(kind: EntityKind, raw_text: impl Into<String>, start: usize, end: usize) -> Self {
        let raw_text = raw_text.into();
        let normalized_text = normalize(&raw_text);
        Self {
            kind,
            raw_text,
            normalized_text,
            start,
            end,
            confidence: 1.0,
        }
    }

    /// Set the confidence score, clamped to [0.0, 1.0]
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Span width in bytes
    pub fn width(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether this span overlaps another span of any kind
    pub fn overlaps(&self, other: &ExtractedEntity) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Normalize a surface string for terminology lookup: trim, lowercase and
/// collapse internal whitespace runs to single spaces.
pub fn normalize(text: &str) -> String {
    text.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
