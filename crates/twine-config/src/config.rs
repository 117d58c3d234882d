//! The `TwineConfig` structure and its defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default number of module generations in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Build configuration.
///
/// Relative `entry` and `root` paths are resolved against the directory the
/// configuration was discovered in; `out`, `mapping` and `cache_file` are
/// resolved against the project root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwineConfig {
    /// Entry source file the crawl starts from.
    pub entry: PathBuf,

    /// Artifact destination. Nothing is written when unset.
    pub out: Option<PathBuf>,

    /// Project root. Defaults to the entry file's directory.
    pub root: Option<PathBuf>,

    /// Maximum number of module generations in flight.
    pub concurrency: usize,

    /// Annotate the artifact for debugging. Does not change the module graph.
    pub development: bool,

    /// Directory holding installed `name@version` components.
    pub components_dir: PathBuf,

    /// Per-component manifest file naming its `main` entry.
    pub manifest: String,

    /// Dependency mapping file. Defaults to `<components_dir>/mapping.json`.
    pub mapping: Option<PathBuf>,

    /// Persisted module cache. Disabled when unset.
    pub cache_file: Option<PathBuf>,

    pub resolve: ResolveConfig,
}

/// Request extraction and resolution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Name of the require-like function scanned for in sources.
    pub require_name: String,

    /// Extension appended to extensionless requests, without the dot.
    pub extension: String,

    /// File name used for directory requests.
    pub index: String,

    /// Check relative requests against the filesystem (file, then directory).
    pub check_filesystem: bool,

    /// Package context used for the entry and for files outside any
    /// `name@version` directory. Defaults to the mapping's first context.
    pub root_context: Option<String>,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            require_name: "require".to_string(),
            extension: "js".to_string(),
            index: "index.js".to_string(),
            check_filesystem: true,
            root_context: None,
        }
    }
}

impl Default for TwineConfig {
    fn default() -> Self {
        Self {
            entry: PathBuf::from("index.js"),
            out: None,
            root: None,
            concurrency: DEFAULT_CONCURRENCY,
            development: false,
            components_dir: PathBuf::from("components"),
            manifest: "component.json".to_string(),
            mapping: None,
            cache_file: None,
            resolve: ResolveConfig::default(),
        }
    }
}

impl TwineConfig {
    /// Create a config for an entry file with every other value defaulted.
    pub fn new(entry: impl Into<PathBuf>) -> Self {
        Self {
            entry: entry.into(),
            ..Self::default()
        }
    }

    /// Resolve relative `entry` and `root` against `base`.
    pub fn rebase(mut self, base: &Path) -> Self {
        if self.entry.is_relative() {
            self.entry = base.join(&self.entry);
        }
        if let Some(root) = self.root.take() {
            self.root = Some(if root.is_relative() {
                base.join(root)
            } else {
                root
            });
        }
        self
    }

    /// The project root: explicit `root`, else the entry's directory.
    pub fn project_root(&self) -> PathBuf {
        match &self.root {
            Some(root) => root.clone(),
            None => self
                .entry
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        }
    }

    /// The dependency mapping file, resolved against the project root.
    pub fn mapping_path(&self) -> PathBuf {
        let root = self.project_root();
        match &self.mapping {
            Some(path) => root.join(path),
            None => root.join(&self.components_dir).join("mapping.json"),
        }
    }
}
