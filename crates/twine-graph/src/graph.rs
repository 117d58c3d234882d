//! The per-build visited set.

use indexmap::IndexMap;

use crate::ids::IdTable;
use crate::record::{ModuleRecord, PackedRecord};

/// Ordered map of identifier to generated record.
///
/// Insertion order is discovery order, which keeps remapping and packing
/// deterministic across builds with unchanged inputs. A key is generated at
/// most once: [`ModuleGraph::insert`] never replaces an existing record.
#[derive(Debug, Clone, Default)]
pub struct ModuleGraph {
    records: IndexMap<String, ModuleRecord>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&ModuleRecord> {
        self.records.get(id)
    }

    /// Insert a record, keeping the existing one if the id was already visited.
    ///
    /// Returns `true` if the record was inserted.
    pub fn insert(&mut self, record: ModuleRecord) -> bool {
        if self.records.contains_key(&record.id) {
            return false;
        }
        self.records.insert(record.id.clone(), record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn records(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.records.values()
    }

    /// Records flagged as traversal roots.
    pub fn entries(&self) -> impl Iterator<Item = &ModuleRecord> {
        self.records.values().filter(|record| record.is_entry)
    }

    pub fn into_records(self) -> Vec<ModuleRecord> {
        self.records.into_values().collect()
    }

    /// Remap every record, in discovery order, into integer space.
    pub fn remap(self, ids: &mut IdTable) -> Vec<PackedRecord> {
        self.records
            .into_values()
            .map(|record| ids.remap(record))
            .collect()
    }
}
