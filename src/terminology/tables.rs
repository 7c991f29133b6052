//! Code table loading and lookup

use crate::domain::{CodedConcept, Result, ScribeError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Concept definition from TOML
#[derive(Debug, Clone, Deserialize)]
struct ConceptDefinition {
    code: String,
    display: String,
    #[serde(default)]
    synonyms: Vec<String>,
}

/// Code table file shape
#[derive(Debug, Deserialize)]
struct TableFile {
    system: String,
    concepts: HashMap<String, ConceptDefinition>,
}

/// One lookup term pointing at a coded concept
#[derive(Debug, Clone)]
struct TableTerm {
    term: String,
    code: String,
    display: String,
}

/// A read-only lookup table from normalized surface strings to coded
/// concepts within one terminology system
///
/// Terms are held longest-first so substring lookups deterministically
/// prefer the most specific match.
#[derive(Debug, Clone)]
pub struct CodeTable {
    system: String,
    terms: Vec<TableTerm>,
}

impl CodeTable {
    /// Load a code table from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ScribeError::Terminology(format!(
                "Failed to read code table {}: {e}",
                path.as_ref().display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parse a code table from TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let file: TableFile = toml::from_str(content)
            .map_err(|e| ScribeError::Terminology(format!("Failed to parse code table: {e}")))?;

        if file.system.is_empty() {
            return Err(ScribeError::Terminology(
                "Code table is missing a system URI".to_string(),
            ));
        }

        let mut terms = Vec::new();
        for (key, def) in &file.concepts {
            if def.code.is_empty() {
                return Err(ScribeError::Terminology(format!(
                    "Concept '{key}' has an empty code"
                )));
            }

            let mut surfaces = vec![key.replace('-', " "), def.display.to_lowercase()];
            surfaces.extend(def.synonyms.iter().map(|s| s.to_lowercase()));
            surfaces.sort();
            surfaces.dedup();

            for surface in surfaces {
                terms.push(TableTerm {
                    term: surface,
                    code: def.code.clone(),
                    display: def.display.clone(),
                });
            }
        }

        // Longest term first, then lexicographic, so lookups are
        // deterministic regardless of TOML map order.
        terms.sort_by(|a, b| {
            b.term
                .len()
                .cmp(&a.term.len())
                .then(a.term.cmp(&b.term))
                .then(a.code.cmp(&b.code))
        });

        Ok(Self {
            system: file.system,
            terms,
        })
    }

    /// The terminology system URI of this table
    pub fn system(&self) -> &str {
        &self.system
    }

    /// Number of lookup terms
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the table has no terms
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Look up a normalized surface string.
    ///
    /// Exact match wins; otherwise the longest term contained in the
    /// query (or containing it) is used. Returns `None` on no match —
    /// the caller supplies the free-text fallback.
    pub fn lookup(&self, normalized: &str) -> Option<CodedConcept> {
        if normalized.is_empty() {
            return None;
        }

        if let Some(hit) = self.terms.iter().find(|t| t.term == normalized) {
            return Some(CodedConcept::mapped(&self.system, &hit.code, &hit.display));
        }

        // Substring pass; terms are longest-first, so the most specific
        // containment wins. Single-character terms never match here.
        self.terms
            .iter()
            .filter(|t| t.term.len() >= 2)
            .find(|t| normalized.contains(t.term.as_str()) || t.term.contains(normalized))
            .map(|hit| CodedConcept::mapped(&self.system, &hit.code, &hit.display))
    }
}
