//! Component manifest lookup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Deserialize;
use twine_graph::Runtime;

use crate::{Error, Result};

#[derive(Debug, Default, Deserialize)]
struct Manifest {
    main: Option<String>,
}

/// Reads the `main` entry of installed components, once per directory.
#[derive(Debug)]
pub struct ManifestCache {
    runtime: Arc<dyn Runtime>,
    file_name: String,
    index: String,
    mains: DashMap<PathBuf, String>,
}

impl ManifestCache {
    pub fn new(runtime: Arc<dyn Runtime>, file_name: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            runtime,
            file_name: file_name.into(),
            index: index.into(),
            mains: DashMap::new(),
        }
    }

    /// Main file of the component in `dir`, defaulting to the index file when
    /// the manifest or its `main` field is absent.
    pub async fn main_for(&self, dir: &Path) -> Result<String> {
        if let Some(main) = self.mains.get(dir) {
            return Ok(main.clone());
        }

        let path = dir.join(&self.file_name);
        let main = match self.runtime.read_to_string(&path).await {
            Ok(text) => serde_json::from_str::<Manifest>(&text)
                .map_err(|e| Error::InvalidManifest {
                    path: path.clone(),
                    reason: e.to_string(),
                })?
                .main
                .filter(|main| !main.is_empty())
                .unwrap_or_else(|| self.index.clone()),
            Err(e) if e.is_not_found() => self.index.clone(),
            Err(e) => return Err(Error::io(path, e)),
        };

        self.mains.insert(dir.to_path_buf(), main.clone());
        Ok(main)
    }
}
