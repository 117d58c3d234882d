//! Module request resolution.
//!
//! [`Resolver::resolve`] maps a request literal and the identifier of the file
//! that made it to the identifier of the required module. Strategies are tried
//! in order and the first match wins:
//!
//! 1. injected virtual module, by exact name
//! 2. trailing `/`: the index file is appended, then resolution continues
//! 3. absolute (`/x`): relative to the project root, default extension added
//! 4. relative (`./x`, `../x`): `x.js`, then `x/index.js`
//! 5. bare (`pad`): a declared dependency of the requiring package context
//!
//! The resolver never touches the graph; callers add its result to the frontier.

mod context;
mod manifest;

pub use context::{ContextResolver, SlugContextResolver};
pub use manifest::ManifestCache;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use path_clean::PathClean;
use rustc_hash::FxHashSet;
use twine_graph::{DependencyMapping, Runtime};

use crate::{Error, Result};

/// Resolution settings shared by every request of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Project root; absolute requests resolve against it.
    pub root: PathBuf,
    /// Directory holding installed `name@version` components.
    pub components_dir: PathBuf,
    /// Default extension, without the dot.
    pub extension: String,
    /// Index file name for directory requests.
    pub index: String,
    /// Component manifest file name.
    pub manifest: String,
    /// Check relative requests against the filesystem.
    pub check_filesystem: bool,
    /// Context for the entry and for files outside any component.
    pub root_context: Option<String>,
}

impl ResolveOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            components_dir: root.join("components"),
            root,
            extension: "js".to_string(),
            index: "index.js".to_string(),
            manifest: "component.json".to_string(),
            check_filesystem: true,
            root_context: None,
        }
    }

    fn with_extension(&self, request: &str) -> String {
        if Path::new(request).extension().is_some() {
            request.to_string()
        } else {
            format!("{request}.{}", self.extension)
        }
    }
}

/// Path-space identifier of a file.
pub(crate) fn path_id(path: &Path) -> String {
    path.clean().to_string_lossy().into_owned()
}

/// Resolves request literals for one build.
#[derive(Debug)]
pub struct Resolver {
    options: ResolveOptions,
    entry: String,
    mapping: DependencyMapping,
    virtuals: FxHashSet<String>,
    contexts: Arc<dyn ContextResolver>,
    manifests: ManifestCache,
    runtime: Arc<dyn Runtime>,
}

impl Resolver {
    pub fn new(
        options: ResolveOptions,
        entry: impl Into<String>,
        mapping: DependencyMapping,
        contexts: Arc<dyn ContextResolver>,
        runtime: Arc<dyn Runtime>,
    ) -> Self {
        let manifests = ManifestCache::new(runtime.clone(), &options.manifest, &options.index);
        Self {
            options,
            entry: entry.into(),
            mapping,
            virtuals: FxHashSet::default(),
            contexts,
            manifests,
            runtime,
        }
    }

    /// Register injected module names, matched ahead of every other strategy.
    pub fn with_virtuals<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.virtuals.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Resolve `request` made by the module identified by `from`.
    pub async fn resolve(&self, request: &str, from: &str) -> Result<String> {
        if self.virtuals.contains(request) {
            return Ok(request.to_string());
        }

        let request = if request.ends_with('/') {
            format!("{request}{}", self.options.index)
        } else {
            request.to_string()
        };

        if let Some(rooted) = request.strip_prefix('/') {
            let file = self.options.root.join(self.options.with_extension(rooted));
            return Ok(path_id(&file));
        }

        if request.starts_with('.') {
            return self.resolve_relative(&request, from).await;
        }

        self.resolve_package(&request, from).await
    }

    async fn resolve_relative(&self, request: &str, from: &str) -> Result<String> {
        let dir = Path::new(from).parent().unwrap_or_else(|| Path::new(""));
        let file = dir.join(self.options.with_extension(request)).clean();

        if !self.options.check_filesystem || self.runtime.is_file(&file).await {
            return Ok(path_id(&file));
        }

        let index = dir.join(request).join(&self.options.index).clean();
        if self.runtime.is_file(&index).await {
            return Ok(path_id(&index));
        }

        Err(Error::UnresolvedDependency {
            request: request.to_string(),
            from: from.to_string(),
            reason: format!(
                "neither {} nor {} exists",
                file.display(),
                index.display()
            ),
        })
    }

    async fn resolve_package(&self, request: &str, from: &str) -> Result<String> {
        let default_context = || {
            self.options
                .root_context
                .clone()
                .or_else(|| self.mapping.default_context().map(str::to_string))
        };

        let context = if from == self.entry {
            default_context()
        } else {
            self.contexts.context_for(from).or_else(default_context)
        };

        let unresolved_context = |context: Option<String>| Error::UnresolvedContext {
            request: request.to_string(),
            from: from.to_string(),
            context,
        };

        let context = context.ok_or_else(|| unresolved_context(None))?;
        if !self.mapping.contains_context(&context) {
            return Err(unresolved_context(Some(context)));
        }

        let slug = self
            .mapping
            .find_dependency(&context, request)
            .ok_or_else(|| Error::UnresolvedDependency {
                request: request.to_string(),
                from: from.to_string(),
                reason: format!("'{context}' declares no dependency named '{request}'"),
            })?;

        let dir = self.options.components_dir.join(slug.to_string());
        let main = if self.options.check_filesystem {
            self.manifests.main_for(&dir).await?
        } else {
            self.options.index.clone()
        };

        Ok(path_id(&dir.join(main)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twine_graph::{MemoryRuntime, Slug};

    fn resolver(runtime: MemoryRuntime, mapping: DependencyMapping) -> Resolver {
        Resolver::new(
            ResolveOptions::new("/p"),
            "/p/index.js",
            mapping,
            Arc::new(SlugContextResolver::new().unwrap()),
            Arc::new(runtime),
        )
    }

    #[tokio::test]
    async fn absolute_requests_resolve_against_root_without_io() {
        let resolver = resolver(MemoryRuntime::new("/p"), DependencyMapping::new());
        assert_eq!(resolver.resolve("/x", "/p/a.js").await.unwrap(), "/p/x.js");
        assert_eq!(
            resolver.resolve("/lib/x.json", "/p/deep/a.js").await.unwrap(),
            "/p/lib/x.json"
        );
        assert_eq!(
            resolver.resolve("/lib/", "/p/a.js").await.unwrap(),
            "/p/lib/index.js"
        );
    }

    #[tokio::test]
    async fn trailing_slash_appends_index() {
        let runtime = MemoryRuntime::new("/p").with_file("/p/lib/index.js", "");
        let resolver = resolver(runtime, DependencyMapping::new());
        assert_eq!(
            resolver.resolve("./lib/", "/p/index.js").await.unwrap(),
            "/p/lib/index.js"
        );
    }

    #[tokio::test]
    async fn parent_relative_requests_are_normalized() {
        let runtime = MemoryRuntime::new("/p").with_file("/p/b.js", "");
        let resolver = resolver(runtime, DependencyMapping::new());
        assert_eq!(
            resolver.resolve("../b", "/p/lib/a.js").await.unwrap(),
            "/p/b.js"
        );
    }

    #[tokio::test]
    async fn simple_variant_never_checks_the_filesystem() {
        let mut options = ResolveOptions::new("/p");
        options.check_filesystem = false;
        let runtime = Arc::new(MemoryRuntime::new("/p"));
        let resolver = Resolver::new(
            options,
            "/p/index.js",
            DependencyMapping::new().with("app", [Slug::new("pad", "1.0.0")]),
            Arc::new(SlugContextResolver::new().unwrap()),
            runtime.clone(),
        );

        assert_eq!(
            resolver.resolve("./missing", "/p/index.js").await.unwrap(),
            "/p/missing.js"
        );
        assert_eq!(
            resolver.resolve("pad", "/p/index.js").await.unwrap(),
            "/p/components/pad@1.0.0/index.js"
        );
        assert_eq!(
            runtime.read_count("/p/components/pad@1.0.0/component.json"),
            0
        );
    }

    #[tokio::test]
    async fn virtual_names_shadow_packages() {
        let mapping = DependencyMapping::new().with("app", [Slug::new("events", "1.0.0")]);
        let resolver = resolver(MemoryRuntime::new("/p"), mapping).with_virtuals(["events"]);
        assert_eq!(
            resolver.resolve("events", "/p/index.js").await.unwrap(),
            "events"
        );
    }

    #[tokio::test]
    async fn package_context_comes_from_the_requiring_file() {
        let mapping = DependencyMapping::new()
            .with("app", [Slug::new("pad", "1.0.0")])
            .with("pad@1.0.0", [Slug::new("emitter", "1.1.1")]);
        let resolver = resolver(MemoryRuntime::new("/p"), mapping);

        assert_eq!(
            resolver
                .resolve("emitter", "/p/components/pad@1.0.0/index.js")
                .await
                .unwrap(),
            "/p/components/emitter@1.1.1/index.js"
        );

        let err = resolver
            .resolve("emitter", "/p/index.js")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnresolvedDependency { .. }));
    }

    #[tokio::test]
    async fn undeclared_contexts_fail() {
        let mapping = DependencyMapping::new().with("app", [Slug::new("pad", "1.0.0")]);
        let resolver = resolver(MemoryRuntime::new("/p"), mapping);

        let err = resolver
            .resolve("emitter", "/p/components/other@2.0.0/index.js")
            .await
            .unwrap_err();
        match err {
            Error::UnresolvedContext { context, from, .. } => {
                assert_eq!(context.as_deref(), Some("other@2.0.0"));
                assert_eq!(from, "/p/components/other@2.0.0/index.js");
            }
            other => panic!("unexpected error: {other}"),
        }

        let empty = self::resolver(MemoryRuntime::new("/p"), DependencyMapping::new());
        let err = empty.resolve("pad", "/p/index.js").await.unwrap_err();
        assert!(matches!(err, Error::UnresolvedContext { context: None, .. }));
    }

    #[tokio::test]
    async fn explicit_root_context_overrides_first_mapping_key() {
        let mut options = ResolveOptions::new("/p");
        options.root_context = Some("site".to_string());
        let resolver = Resolver::new(
            options,
            "/p/index.js",
            DependencyMapping::new()
                .with("app", [Slug::new("pad", "1.0.0")])
                .with("site", [Slug::new("pad", "2.0.0")]),
            Arc::new(SlugContextResolver::new().unwrap()),
            Arc::new(MemoryRuntime::new("/p")),
        );

        assert_eq!(
            resolver.resolve("pad", "/p/lib/util.js").await.unwrap(),
            "/p/components/pad@2.0.0/index.js"
        );
    }
}
