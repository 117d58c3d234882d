//! Module records.
//!
//! A [`ModuleRecord`] is produced once per distinct file (or injected virtual
//! module) during a build. The identifier type parameter tracks which space the
//! record lives in: path-space (`String`) while the graph is being crawled and
//! cached, integer-space (`u32`) after [`IdTable::remap`](crate::IdTable::remap).

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A record whose identifiers have been remapped to integers.
pub type PackedRecord = ModuleRecord<u32>;

/// One generated module.
///
/// The serialized field names (`id`, `entry`, `modifiedAt`, `src`, `deps`)
/// are the persisted cache format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord<I = String> {
    /// Canonical absolute path or virtual module name, or integer id after remap.
    pub id: I,

    /// True only for the traversal root.
    #[serde(rename = "entry")]
    pub is_entry: bool,

    /// Modification time (milliseconds since epoch) observed at generation.
    ///
    /// `None` for virtual modules, which are always fresh.
    #[serde(rename = "modifiedAt")]
    pub modified_at: Option<u64>,

    /// Source text after the full transform chain has run.
    #[serde(rename = "src")]
    pub source: String,

    /// Literal request string found in the source to resolved identifier.
    ///
    /// Two literals may resolve to the same identifier; both keys are kept
    /// because the literal is the runtime lookup key.
    #[serde(rename = "deps")]
    pub dependencies: IndexMap<String, I>,

    /// Auxiliary data stashed by transforms.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, serde_json::Value>,
}

impl ModuleRecord<String> {
    /// Create an empty in-progress record for a file.
    pub fn new(id: impl Into<String>, is_entry: bool, modified_at: Option<u64>) -> Self {
        Self {
            id: id.into(),
            is_entry,
            modified_at,
            source: String::new(),
            dependencies: IndexMap::new(),
            meta: BTreeMap::new(),
        }
    }

    /// Create the record of an injected virtual module.
    ///
    /// Virtual modules carry no dependencies and no timestamp.
    pub fn virtual_module(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::new(name, false, None)
        }
    }
}

impl<I> ModuleRecord<I> {
    /// Whether this record was injected rather than read from disk.
    pub fn is_virtual(&self) -> bool {
        self.modified_at.is_none()
    }

    /// Whether this record is still valid for a file whose current
    /// modification time is `current`.
    pub fn is_fresh(&self, current: Option<u64>) -> bool {
        match self.modified_at {
            None => true,
            Some(recorded) => current == Some(recorded),
        }
    }
}
