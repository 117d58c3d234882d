//! Persisted module cache.
//!
//! The cache file is a JSON array of path-space records in the format of
//! [`ModuleRecord`]'s serde representation (`id`, `entry`, `modifiedAt`,
//! `src`, `deps`). It is written after every successful build and read at the
//! start of the next one; a file whose modification time still equals the
//! cached `modifiedAt` is reused without being read or transformed.
//!
//! Cache problems never fail a build. An unreadable or corrupt cache is
//! logged and the build runs cold.

use std::path::Path;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};
use twine_graph::{ModuleRecord, Runtime};

/// Records of a previous build, keyed by path-space id.
#[derive(Debug, Clone, Default)]
pub struct ModuleCache {
    records: FxHashMap<String, ModuleRecord>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a cache from records, e.g. the output of a previous crawl.
    pub fn from_records(records: impl IntoIterator<Item = ModuleRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .filter(|record| !record.is_virtual())
                .map(|record| (record.id.clone(), record))
                .collect(),
        }
    }

    /// Load the cache file at `path`. Missing or unreadable files yield an
    /// empty cache.
    pub async fn load(runtime: &dyn Runtime, path: &Path) -> Self {
        let text = match runtime.read_to_string(path).await {
            Ok(text) => text,
            Err(e) if e.is_not_found() => {
                debug!(path = %path.display(), "no module cache yet");
                return Self::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read module cache");
                return Self::new();
            }
        };

        match serde_json::from_str::<Vec<ModuleRecord>>(&text) {
            Ok(records) => {
                let cache = Self::from_records(records);
                debug!(path = %path.display(), modules = cache.len(), "loaded module cache");
                cache
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring corrupt module cache");
                Self::new()
            }
        }
    }

    /// Write `records` to `path`, logging rather than returning failures.
    pub async fn save<'a>(
        runtime: &dyn Runtime,
        path: &Path,
        records: impl IntoIterator<Item = &'a ModuleRecord>,
    ) {
        let records: Vec<&ModuleRecord> = records
            .into_iter()
            .filter(|record| !record.is_virtual())
            .collect();

        let json = match serde_json::to_vec(&records) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize module cache");
                return;
            }
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if let Err(e) = runtime.create_dir(parent, true).await {
                warn!(path = %parent.display(), error = %e, "failed to create module cache directory");
                return;
            }
        }

        match runtime.write_file(path, &json).await {
            Ok(()) => debug!(path = %path.display(), modules = records.len(), "saved module cache"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to write module cache"),
        }
    }

    /// The cached record for `id` if it was generated at modification time
    /// `modified`.
    pub fn fresh(&self, id: &str, modified: Option<u64>) -> Option<&ModuleRecord> {
        self.records
            .get(id)
            .filter(|record| modified.is_some() && record.modified_at == modified)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
