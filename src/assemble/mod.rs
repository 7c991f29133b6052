//! Bundle assembly
//!
//! Orders records by their dependency graph, mints a stable internal
//! identifier per record, rewrites in-flight references to `urn:uuid:`
//! anchors and emits a transaction bundle. A dependency cycle or a
//! dangling reference fails the whole assembly; no partial bundle is
//! ever returned.

use crate::domain::{
    AssemblyError, Bundle, BundleEntry, LocalKey, Record, RecordRef, Result,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Assembles records into a transaction bundle
///
/// Stateless; one assembler can serve concurrent pipeline invocations.
pub struct BundleAssembler;

impl BundleAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Assemble a bundle from in-flight records.
    ///
    /// Entry order is a topological order of the dependency graph; ties
    /// break by category precedence (identity, then requests, then
    /// events, then observations) and, within a category, by the
    /// original record order.
    pub fn assemble(&self, records: Vec<Record>) -> Result<Bundle> {
        if records.is_empty() {
            return Ok(Bundle::new(Vec::new()));
        }

        let index_by_key = Self::index_records(&records)?;
        Self::check_references(&records, &index_by_key)?;

        let order = Self::topological_order(&records, &index_by_key)?;

        // Mint internal ids in emission order, then rewrite every local
        // reference through the minted map.
        let mut minted: HashMap<LocalKey, Uuid> = HashMap::new();
        for &idx in &order {
            minted.insert(records[idx].local_key.clone(), Uuid::new_v4());
        }

        let mut slots: Vec<Option<Record>> = records.into_iter().map(Some).collect();
        let mut entries = Vec::with_capacity(order.len());
        for idx in order {
            if let Some(mut record) = slots[idx].take() {
                Self::rewrite_references(&mut record, &minted)?;
                let internal_id = minted[&record.local_key];
                entries.push(BundleEntry {
                    internal_id,
                    record,
                });
            }
        }

        let bundle = Bundle::new(entries);
        tracing::debug!(entries = bundle.len(), "Assembled transaction bundle");
        Ok(bundle)
    }

    /// Index records by local key, rejecting duplicates
    fn index_records(records: &[Record]) -> Result<HashMap<LocalKey, usize>> {
        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if index.insert(record.local_key.clone(), i).is_some() {
                return Err(AssemblyError::DuplicateLocalKey(record.local_key.clone()).into());
            }
        }
        Ok(index)
    }

    /// Every local reference must target a record in this set
    fn check_references(
        records: &[Record],
        index_by_key: &HashMap<LocalKey, usize>,
    ) -> Result<()> {
        for record in records {
            for (field, reference) in &record.references {
                if let RecordRef::Local(target) = reference {
                    if !index_by_key.contains_key(target) {
                        return Err(AssemblyError::DanglingReference {
                            from: record.local_key.clone(),
                            field: field.clone(),
                            target: target.clone(),
                        }
                        .into());
                    }
                }
            }
        }
        Ok(())
    }

    /// Kahn's algorithm with a deterministic ready-set: lowest category
    /// first, then original position.
    fn topological_order(
        records: &[Record],
        index_by_key: &HashMap<LocalKey, usize>,
    ) -> Result<Vec<usize>> {
        let n = records.len();
        let mut indegree = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (i, record) in records.iter().enumerate() {
            let mut seen: HashSet<usize> = HashSet::new();
            for dep in record.dependencies() {
                let target = index_by_key[dep];
                if target != i && seen.insert(target) {
                    indegree[i] += 1;
                    dependents[target].push(i);
                }
            }
            // A record referencing itself is a one-node cycle.
            if record.dependencies().any(|d| index_by_key[d] == i) {
                return Err(AssemblyError::DependencyCycle {
                    keys: vec![record.local_key.clone()],
                }
                .into());
            }
        }

        let mut ready: Vec<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        // Pick the ready record with the lowest (category, position) each
        // round so entry order is deterministic.
        while let Some(pos) = ready
            .iter()
            .enumerate()
            .min_by_key(|(_, &i)| (records[i].category(), i))
            .map(|(slot, _)| slot)
        {
            let next = ready.swap_remove(pos);
            order.push(next);

            for &dependent in &dependents[next] {
                indegree[dependent] -= 1;
                if indegree[dependent] == 0 {
                    ready.push(dependent);
                }
            }
        }

        if order.len() < n {
            let stuck: Vec<LocalKey> = (0..n)
                .filter(|&i| indegree[i] > 0)
                .map(|i| records[i].local_key.clone())
                .collect();
            return Err(AssemblyError::DependencyCycle { keys: stuck }.into());
        }

        Ok(order)
    }

    /// Replace every local reference with the `urn:uuid:` anchor of its
    /// target; concrete references are left untouched.
    fn rewrite_references(record: &mut Record, minted: &HashMap<LocalKey, Uuid>) -> Result<()> {
        for (field, reference) in record.references.iter_mut() {
            if let RecordRef::Local(target) = reference {
                let id = minted.get(target).ok_or_else(|| AssemblyError::DanglingReference {
                    from: record.local_key.clone(),
                    field: field.clone(),
                    target: target.clone(),
                })?;
                *reference = RecordRef::Concrete(format!("urn:uuid:{id}"));
            }
        }
        Ok(())
    }
}

impl Default for BundleAssembler {
    fn default() -> Self {
        Self::new()
    }
}
