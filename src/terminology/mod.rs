//! Terminology mapping
//!
//! Maps normalized entity surface strings to coded concepts across three
//! code systems: drug codes (RxNorm), clinical findings/procedures/routes
//! /devices (SNOMED CT), and laboratory/vital-sign observations (LOINC).
//! Mapping is total: a term no table knows degrades to a free-text
//! fallback concept, never to an error and never to a synthetic
//! placeholder code.

pub mod tables;

pub use tables::CodeTable;

use crate::domain::{CodedConcept, EntityKind, Result};
use std::path::Path;

/// Terminology mapper backed by the three embedded code tables
///
/// Read-only after construction; safe to share across concurrent
/// pipeline invocations.
pub struct TerminologyMapper {
    drugs: CodeTable,
    clinical: CodeTable,
    labs: CodeTable,
}

impl TerminologyMapper {
    /// Create a mapper with the built-in code tables
    pub fn new() -> Result<Self> {
        Ok(Self {
            drugs: CodeTable::from_toml(include_str!("../../terminology/drug_codes.toml"))?,
            clinical: CodeTable::from_toml(include_str!("../../terminology/clinical_codes.toml"))?,
            labs: CodeTable::from_toml(include_str!("../../terminology/lab_codes.toml"))?,
        })
    }

    /// Create a mapper from custom table files
    pub fn from_files<P: AsRef<Path>>(drugs: P, clinical: P, labs: P) -> Result<Self> {
        Ok(Self {
            drugs: CodeTable::from_file(drugs)?,
            clinical: CodeTable::from_file(clinical)?,
            labs: CodeTable::from_file(labs)?,
        })
    }

    /// Create a mapper with per-table overrides, falling back to the
    /// built-in table for any path left unset
    pub fn with_overrides(
        drugs: Option<&str>,
        clinical: Option<&str>,
        labs: Option<&str>,
    ) -> Result<Self> {
        let builtin = Self::new()?;
        Ok(Self {
            drugs: match drugs {
                Some(path) => CodeTable::from_file(path)?,
                None => builtin.drugs,
            },
            clinical: match clinical {
                Some(path) => CodeTable::from_file(path)?,
                None => builtin.clinical,
            },
            labs: match labs {
                Some(path) => CodeTable::from_file(path)?,
                None => builtin.labs,
            },
        })
    }

    /// Map a normalized surface string to a coded concept.
    ///
    /// Always returns a concept: either a real code from the table for
    /// this kind, or the pure-text fallback. Patient and Dosage kinds
    /// have no terminology namespace and always fall back.
    pub fn map_concept(&self, kind: EntityKind, normalized: &str) -> CodedConcept {
        let table = match kind {
            EntityKind::Medication => Some(&self.drugs),
            EntityKind::Route | EntityKind::Device | EntityKind::Procedure => Some(&self.clinical),
            EntityKind::LabTest | EntityKind::Observation => Some(&self.labs),
            EntityKind::Patient | EntityKind::Dosage => None,
        };

        table
            .and_then(|t| t.lookup(normalized))
            .unwrap_or_else(|| CodedConcept::fallback(normalized))
    }

    /// The drug code table
    pub fn drug_table(&self) -> &CodeTable {
        &self.drugs
    }

    /// The clinical findings/procedures table
    pub fn clinical_table(&self) -> &CodeTable {
        &self.clinical
    }

    /// The laboratory/observation table
    pub fn lab_table(&self) -> &CodeTable {
        &self.labs
    }
}
