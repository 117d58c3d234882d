//! The public build API.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use path_clean::PathClean;
use tracing::{debug, info};
use twine_config::TwineConfig;
use twine_graph::{DependencyMapping, IdTable, ModuleGraph, ModuleRecord, PackedRecord, Runtime};

use crate::cache::ModuleCache;
use crate::crawler::Crawler;
use crate::extract::RequestExtractor;
use crate::pack::Packer;
use crate::resolver::{ContextResolver, ResolveOptions, Resolver, SlugContextResolver, path_id};
use crate::transform::{Transform, TransformChain, TransformEntry};
use crate::{Error, Result};

/// Result of a successful [`Builder::build`].
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// The packed script.
    pub artifact: String,
    /// Remapped records in discovery order.
    pub records: Vec<PackedRecord>,
    /// Ids invoked when the artifact loads.
    pub entries: Vec<u32>,
    /// Path-space to integer id table of this build.
    pub ids: IdTable,
    /// The crawled graph before remapping.
    pub graph: ModuleGraph,
    /// Where the artifact was written, if anywhere.
    pub written_to: Option<PathBuf>,
}

/// Bundles the dependency closure of one entry file.
///
/// Each call to [`build`](Builder::build) or [`entries`](Builder::entries)
/// starts from an empty graph and id table; only the optional cache file
/// carries state between builds.
///
/// # Example
///
/// ```no_run
/// use twine_bundler::{Builder, transform_fn};
///
/// # #[tokio::main]
/// # async fn main() -> twine_bundler::Result<()> {
/// let output = Builder::new("index.js")
///     .transform_ext("json", transform_fn("json", |src, _| {
///         Ok(Some(format!("module.exports = {src};")))
///     }))
///     .cache_file(".twine/cache.json")
///     .build()
///     .await?;
///
/// assert_eq!(output.entries, [1]);
/// # Ok(()) }
/// ```
#[derive(Debug)]
pub struct Builder {
    entry: PathBuf,
    root: Option<PathBuf>,
    out: Option<PathBuf>,
    development: bool,
    concurrency: usize,
    components_dir: PathBuf,
    manifest: String,
    mapping: Option<DependencyMapping>,
    mapping_file: Option<PathBuf>,
    cache_file: Option<PathBuf>,
    require_name: String,
    extension: String,
    index: String,
    check_filesystem: bool,
    root_context: Option<String>,
    transforms: TransformChain,
    injected: IndexMap<String, ModuleRecord>,
    runtime: Option<Arc<dyn Runtime>>,
    contexts: Option<Arc<dyn ContextResolver>>,
}

impl Builder {
    /// Start a build of `entry`. Its directory is the default project root.
    pub fn new(entry: impl Into<PathBuf>) -> Self {
        let defaults = TwineConfig::default();
        Self {
            entry: entry.into(),
            root: None,
            out: None,
            development: defaults.development,
            concurrency: defaults.concurrency,
            components_dir: defaults.components_dir,
            manifest: defaults.manifest,
            mapping: None,
            mapping_file: None,
            cache_file: None,
            require_name: defaults.resolve.require_name,
            extension: defaults.resolve.extension,
            index: defaults.resolve.index,
            check_filesystem: defaults.resolve.check_filesystem,
            root_context: None,
            transforms: TransformChain::new(),
            injected: IndexMap::new(),
            runtime: None,
            contexts: None,
        }
    }

    /// Map a loaded [`TwineConfig`] onto a builder.
    pub fn from_config(config: &TwineConfig) -> Self {
        let mut builder = Self::new(&config.entry)
            .directory(config.project_root())
            .development(config.development)
            .concurrency(config.concurrency)
            .components_dir(&config.components_dir)
            .manifest(config.manifest.clone())
            .require_name(config.resolve.require_name.clone())
            .extension(config.resolve.extension.clone())
            .index(config.resolve.index.clone())
            .check_filesystem(config.resolve.check_filesystem);

        builder.out = config.out.clone();
        builder.mapping_file = config.mapping.clone();
        builder.cache_file = config.cache_file.clone();
        builder.root_context = config.resolve.root_context.clone();
        builder
    }

    /// Project root. Absolute requests, the components directory and
    /// relative output paths resolve against it.
    pub fn directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.root = Some(dir.into());
        self
    }

    /// Write the artifact to `file` after a successful build.
    pub fn to(mut self, file: impl Into<PathBuf>) -> Self {
        self.out = Some(file.into());
        self
    }

    pub fn development(mut self, enabled: bool) -> Self {
        self.development = enabled;
        self
    }

    /// Maximum number of files generated at once. Must be at least 1.
    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit;
        self
    }

    /// Register a transform for every file.
    pub fn transform<T: Transform + 'static>(mut self, transform: T) -> Self {
        self.transforms.push(TransformEntry::Any(Arc::new(transform)));
        self
    }

    /// Register a transform for files with extension `ext`.
    pub fn transform_ext<T: Transform + 'static>(mut self, ext: &str, transform: T) -> Self {
        self.transforms
            .push(TransformEntry::extension(ext, Arc::new(transform)));
        self
    }

    /// Inject a virtual module. Requests equal to `name` resolve to it before
    /// any other strategy is tried.
    pub fn include(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        let name = name.into();
        self.injected
            .insert(name.clone(), ModuleRecord::virtual_module(name, source));
        self
    }

    /// Use an in-memory dependency mapping instead of reading one.
    pub fn mapping(mut self, mapping: DependencyMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Read the dependency mapping from `file`. Defaults to
    /// `<components>/mapping.json`.
    pub fn mapping_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.mapping_file = Some(file.into());
        self
    }

    /// Persist module records to `file` and reuse unchanged ones next build.
    pub fn cache_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.cache_file = Some(file.into());
        self
    }

    pub fn components_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.components_dir = dir.into();
        self
    }

    pub fn manifest(mut self, file_name: impl Into<String>) -> Self {
        self.manifest = file_name.into();
        self
    }

    pub fn require_name(mut self, name: impl Into<String>) -> Self {
        self.require_name = name.into();
        self
    }

    pub fn extension(mut self, ext: impl Into<String>) -> Self {
        self.extension = ext.into();
        self
    }

    pub fn index(mut self, file_name: impl Into<String>) -> Self {
        self.index = file_name.into();
        self
    }

    /// Disable to resolve relative requests without existence checks.
    pub fn check_filesystem(mut self, enabled: bool) -> Self {
        self.check_filesystem = enabled;
        self
    }

    /// Context used for the entry and for files outside any component.
    pub fn root_context(mut self, context: impl Into<String>) -> Self {
        self.root_context = Some(context.into());
        self
    }

    pub fn runtime(mut self, runtime: Arc<dyn Runtime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Replace the `name@version` path convention for package contexts.
    pub fn context_resolver(mut self, contexts: Arc<dyn ContextResolver>) -> Self {
        self.contexts = Some(contexts);
        self
    }

    /// Crawl the graph without remapping or packing.
    pub async fn entries(&self) -> Result<ModuleGraph> {
        let session = self.prepare().await?;
        session.crawl(self).await
    }

    /// Crawl, remap, pack and (if [`to`](Builder::to) was set) write.
    pub async fn build(&self) -> Result<BuildOutput> {
        let session = self.prepare().await?;
        let graph = session.crawl(self).await?;

        if let Some(path) = &session.cache_path {
            ModuleCache::save(session.runtime.as_ref(), path, graph.records()).await;
        }

        let mut ids = IdTable::new();
        let records = graph.clone().remap(&mut ids);
        let entries: Vec<u32> = records
            .iter()
            .filter(|record| record.is_entry)
            .map(|record| record.id)
            .collect();

        let artifact = Packer::new(self.development).pack(&records, &entries, |id| ids.key_for(id));

        let written_to = match &self.out {
            Some(out) => {
                let path = session.root.join(out).clean();
                self.write(session.runtime.as_ref(), &path, &artifact).await?;
                Some(path)
            }
            None => None,
        };

        info!(
            entry = %session.entry,
            modules = records.len(),
            bytes = artifact.len(),
            "build complete"
        );

        Ok(BuildOutput {
            artifact,
            records,
            entries,
            ids,
            graph,
            written_to,
        })
    }

    async fn write(&self, runtime: &dyn Runtime, path: &Path, artifact: &str) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            runtime
                .create_dir(parent, true)
                .await
                .map_err(|e| Error::io(parent, e))?;
        }
        runtime
            .write_file(path, artifact.as_bytes())
            .await
            .map_err(|e| Error::io(path, e))
    }

    async fn prepare(&self) -> Result<Session> {
        if self.concurrency == 0 {
            return Err(Error::InvalidConfig(
                "concurrency must be at least 1".to_string(),
            ));
        }

        let runtime = match &self.runtime {
            Some(runtime) => runtime.clone(),
            None => default_runtime().ok_or_else(|| {
                Error::InvalidConfig("no filesystem runtime configured".to_string())
            })?,
        };

        let absolute = |path: &Path| -> Result<PathBuf> {
            if path.is_absolute() {
                Ok(path.clean())
            } else {
                let cwd = runtime.get_cwd().map_err(|e| Error::io(path, e))?;
                Ok(cwd.join(path).clean())
            }
        };

        let entry = absolute(&self.entry)?;
        let root = match &self.root {
            Some(root) => absolute(root)?,
            None => entry.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        let components_dir = root.join(&self.components_dir).clean();

        let mapping = match &self.mapping {
            Some(mapping) => mapping.clone(),
            None => {
                let path = match &self.mapping_file {
                    Some(file) => root.join(file),
                    None => components_dir.join("mapping.json"),
                };
                load_mapping(runtime.as_ref(), &path).await?
            }
        };

        let extractor = RequestExtractor::new(&self.require_name).map_err(|e| {
            Error::InvalidConfig(format!("invalid require name '{}': {}", self.require_name, e))
        })?;

        let contexts: Arc<dyn ContextResolver> = match &self.contexts {
            Some(contexts) => contexts.clone(),
            None => Arc::new(
                SlugContextResolver::new().map_err(|e| Error::InvalidConfig(e.to_string()))?,
            ),
        };

        let options = ResolveOptions {
            root: root.clone(),
            components_dir,
            extension: self.extension.clone(),
            index: self.index.clone(),
            manifest: self.manifest.clone(),
            check_filesystem: self.check_filesystem,
            root_context: self.root_context.clone(),
        };

        let entry = path_id(&entry);
        let resolver = Resolver::new(options, entry.clone(), mapping, contexts, runtime.clone())
            .with_virtuals(self.injected.keys().cloned());

        let cache_path = self.cache_file.as_ref().map(|file| root.join(file).clean());
        let cache = match &cache_path {
            Some(path) => ModuleCache::load(runtime.as_ref(), path).await,
            None => ModuleCache::new(),
        };

        Ok(Session {
            runtime,
            entry,
            root,
            resolver,
            extractor,
            cache,
            cache_path,
        })
    }
}

/// Per-build state derived from a [`Builder`].
struct Session {
    runtime: Arc<dyn Runtime>,
    entry: String,
    root: PathBuf,
    resolver: Resolver,
    extractor: RequestExtractor,
    cache: ModuleCache,
    cache_path: Option<PathBuf>,
}

impl Session {
    async fn crawl(&self, builder: &Builder) -> Result<ModuleGraph> {
        let crawler = Crawler {
            runtime: self.runtime.as_ref(),
            resolver: &self.resolver,
            transforms: &builder.transforms,
            extractor: &self.extractor,
            cache: &self.cache,
            injected: &builder.injected,
            concurrency: builder.concurrency,
        };
        crawler.crawl(&self.entry).await
    }
}

async fn load_mapping(runtime: &dyn Runtime, path: &Path) -> Result<DependencyMapping> {
    match runtime.read_to_string(path).await {
        Ok(text) => DependencyMapping::from_json(&text).map_err(|e| Error::InvalidMapping {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
        Err(e) if e.is_not_found() => {
            debug!(path = %path.display(), "no dependency mapping, bare requests will not resolve");
            Ok(DependencyMapping::new())
        }
        Err(e) => Err(Error::io(path, e)),
    }
}

#[cfg(not(target_family = "wasm"))]
fn default_runtime() -> Option<Arc<dyn Runtime>> {
    Some(Arc::new(twine_graph::NativeRuntime::new()))
}

#[cfg(target_family = "wasm")]
fn default_runtime() -> Option<Arc<dyn Runtime>> {
    None
}
