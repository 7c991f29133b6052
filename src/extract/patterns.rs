//! Pattern library for entity extraction

use crate::domain::{EntityKind, Result, ScribeError};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Pattern definition from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct PatternDefinition {
    /// Regex patterns for this rule
    pub patterns: Vec<String>,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    /// Entity kind label
    pub kind: String,
    /// Rule precedence; higher-priority rules are applied first so that
    /// cue-anchored multi-token patterns win over generic fallbacks
    #[serde(default)]
    pub priority: i32,
}

/// Compiled pattern with metadata
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Compiled regex; case-insensitive, run against the original text
    pub regex: Regex,
    /// Entity kind this rule produces
    pub kind: EntityKind,
    /// Confidence score
    pub confidence: f32,
    /// Rule precedence
    pub priority: i32,
}

/// Pattern library container
#[derive(Debug, Deserialize)]
struct PatternLibrary {
    patterns: HashMap<String, PatternDefinition>,
}

/// Pattern registry for entity extraction
///
/// Holds the compiled rules in a deterministic order: priority
/// descending, then rule name, so extraction output is reproducible
/// regardless of TOML map iteration order.
pub struct PatternRegistry {
    patterns: Vec<CompiledPattern>,
}

impl PatternRegistry {
    /// Create a pattern registry from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ScribeError::Extraction(format!(
                "Failed to read pattern library {}: {e}",
                path.as_ref().display()
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Create a pattern registry from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let library: PatternLibrary = toml::from_str(content)
            .map_err(|e| ScribeError::Extraction(format!("Failed to parse pattern library: {e}")))?;

        let mut named: Vec<(String, PatternDefinition)> = library.patterns.into_iter().collect();
        named.sort_by(|(a_name, a), (b_name, b)| {
            b.priority.cmp(&a.priority).then(a_name.cmp(b_name))
        });

        let mut patterns = Vec::new();
        for (name, def) in named {
            let kind = Self::parse_kind(&def.kind).ok_or_else(|| {
                ScribeError::Extraction(format!(
                    "Unknown entity kind in pattern '{name}': {}",
                    def.kind
                ))
            })?;

            for pattern_str in &def.patterns {
                // Case-insensitivity is a matching strategy; offsets and
                // matched text stay tied to the original input.
                let regex = Regex::new(&format!("(?i){pattern_str}")).map_err(|e| {
                    ScribeError::Extraction(format!(
                        "Invalid regex in pattern '{name}': {pattern_str}: {e}"
                    ))
                })?;

                patterns.push(CompiledPattern {
                    regex,
                    kind,
                    confidence: def.confidence,
                    priority: def.priority,
                });
            }
        }

        Ok(Self { patterns })
    }

    /// Create a registry with the built-in pattern library
    pub fn default_patterns() -> Result<Self> {
        let default_toml = include_str!("../../patterns/entity_patterns.toml");
        Self::from_toml(default_toml)
    }

    /// All rules, priority descending
    pub fn all_patterns(&self) -> &[CompiledPattern] {
        &self.patterns
    }

    /// Rules for a specific entity kind, priority descending
    pub fn patterns_for_kind(&self, kind: EntityKind) -> impl Iterator<Item = &CompiledPattern> {
        self.patterns.iter().filter(move |p| p.kind == kind)
    }

    /// Parse a kind label to an EntityKind
    fn parse_kind(s: &str) -> Option<EntityKind> {
        match s.to_uppercase().as_str() {
            "PATIENT" => Some(EntityKind::Patient),
            "MEDICATION" | "DRUG" => Some(EntityKind::Medication),
            "DOSAGE" | "DOSE" => Some(EntityKind::Dosage),
            "ROUTE" => Some(EntityKind::Route),
            "DEVICE" => Some(EntityKind::Device),
            "LAB_TEST" | "LAB" => Some(EntityKind::LabTest),
            "OBSERVATION" | "VITAL_SIGN" => Some(EntityKind::Observation),
            "PROCEDURE" => Some(EntityKind::Procedure),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_default_patterns() {
        let registry = PatternRegistry::default_patterns().unwrap();
        assert!(!registry.all_patterns().is_empty());
    }

    #[test]
    fn test_patterns_sorted_by_priority() {
        let registry = PatternRegistry::default_patterns().unwrap();
        let priorities: Vec<i32> = registry.all_patterns().iter().map(|p| p.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(priorities, sorted);
    }

    #[test]
    fn test_medication_lexicon_matches() {
        let registry = PatternRegistry::default_patterns().unwrap();
        let matched = registry
            .patterns_for_kind(EntityKind::Medication)
            .any(|p| p.regex.is_match("started on Cisplatin today"));
        assert!(matched);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let toml = r#"
            [patterns.bad]
            kind = "NOT_A_KIND"
            confidence = 0.5
            patterns = ['x']
        "#;
        assert!(PatternRegistry::from_toml(toml).is_err());
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let toml = r#"
            [patterns.bad]
            kind = "MEDICATION"
            confidence = 0.5
            patterns = ['(unclosed']
        "#;
        assert!(PatternRegistry::from_toml(toml).is_err());
    }
}
