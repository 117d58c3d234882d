//! Identifier remapping.
//!
//! Paths are long and leak the build machine's layout, so before packing every
//! identifier is replaced by a small integer. An identifier gets its integer
//! the first time it is *remapped*, which is not necessarily the order in which
//! it was visited.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;

use crate::record::{ModuleRecord, PackedRecord};

/// First integer handed out by an [`IdTable`].
pub const ID_BASE: u32 = 1;

/// Monotonic path to integer table, scoped to one build.
#[derive(Debug, Clone)]
pub struct IdTable {
    by_key: FxHashMap<String, u32>,
    keys: Vec<String>,
}

impl IdTable {
    pub fn new() -> Self {
        Self {
            by_key: FxHashMap::default(),
            keys: Vec::new(),
        }
    }

    /// Return the integer for `key`, allocating the next one on first use.
    pub fn assign(&mut self, key: &str) -> u32 {
        if let Some(id) = self.by_key.get(key) {
            return *id;
        }

        let id = ID_BASE + self.keys.len() as u32;
        self.by_key.insert(key.to_string(), id);
        self.keys.push(key.to_string());
        id
    }

    /// Look up an already assigned integer without allocating.
    pub fn get(&self, key: &str) -> Option<u32> {
        self.by_key.get(key).copied()
    }

    /// Reverse lookup: the path or virtual name behind an integer.
    pub fn key_for(&self, id: u32) -> Option<&str> {
        let index = id.checked_sub(ID_BASE)? as usize;
        self.keys.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Rewrite a record from path-space to integer-space.
    ///
    /// The record's own id is assigned before its dependencies.
    pub fn remap(&mut self, record: ModuleRecord<String>) -> PackedRecord {
        let id = self.assign(&record.id);
        let dependencies: IndexMap<String, u32> = record
            .dependencies
            .into_iter()
            .map(|(request, target)| {
                let target = self.assign(&target);
                (request, target)
            })
            .collect();

        ModuleRecord {
            id,
            is_entry: record.is_entry,
            modified_at: record.modified_at,
            source: record.source,
            dependencies,
            meta: record.meta,
        }
    }
}

impl Default for IdTable {
    fn default() -> Self {
        Self::new()
    }
}
