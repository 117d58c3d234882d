//! Source transforms.
//!
//! A [`TransformChain`] is an ordered list of [`TransformEntry`] values, each
//! either applying to every file or bound to one file extension. Entries run
//! strictly in registration order and each one sees the output of the last.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use twine_graph::ModuleRecord;

use crate::{Error, Result};

/// A source-to-source rewrite applied before request extraction.
///
/// Returning `Ok(None)` empties the source; it does not skip the transform.
/// The record is the in-progress module, so a transform may stash data in
/// [`ModuleRecord::meta`].
///
/// # Example
///
/// ```rust,ignore
/// struct Uppercase;
///
/// #[async_trait]
/// impl Transform for Uppercase {
///     fn name(&self) -> &str {
///         "uppercase"
///     }
///
///     async fn transform(&self, source: String, _record: &mut ModuleRecord)
///         -> anyhow::Result<Option<String>>
///     {
///         Ok(Some(source.to_uppercase()))
///     }
/// }
/// ```
#[async_trait]
pub trait Transform: Send + Sync {
    /// Name reported in `TransformFailure` errors.
    fn name(&self) -> &str;

    async fn transform(
        &self,
        source: String,
        record: &mut ModuleRecord,
    ) -> anyhow::Result<Option<String>>;
}

/// Synchronous closure transform. See [`transform_fn`].
pub struct FnTransform<F> {
    name: String,
    func: F,
}

#[async_trait]
impl<F> Transform for FnTransform<F>
where
    F: Fn(String, &mut ModuleRecord) -> anyhow::Result<Option<String>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn transform(
        &self,
        source: String,
        record: &mut ModuleRecord,
    ) -> anyhow::Result<Option<String>> {
        (self.func)(source, record)
    }
}

/// Wrap a synchronous closure as a named [`Transform`].
pub fn transform_fn<F>(name: impl Into<String>, func: F) -> FnTransform<F>
where
    F: Fn(String, &mut ModuleRecord) -> anyhow::Result<Option<String>> + Send + Sync,
{
    FnTransform {
        name: name.into(),
        func,
    }
}

/// One registered transform.
#[derive(Clone)]
pub enum TransformEntry {
    /// Runs on every file.
    Any(Arc<dyn Transform>),
    /// Runs only on files whose extension equals `ext` (no leading dot).
    Extension {
        ext: String,
        transform: Arc<dyn Transform>,
    },
}

impl TransformEntry {
    /// Bind a transform to an extension. `"jade"`, `".jade"` and `"tpl.jade"`
    /// all bind to `jade`.
    pub fn extension(ext: &str, transform: Arc<dyn Transform>) -> Self {
        let ext = ext.rsplit('.').next().unwrap_or(ext).to_string();
        TransformEntry::Extension { ext, transform }
    }

    fn applies_to(&self, ext: Option<&str>) -> bool {
        match self {
            TransformEntry::Any(_) => true,
            TransformEntry::Extension { ext: bound, .. } => ext == Some(bound.as_str()),
        }
    }

    fn transform(&self) -> &Arc<dyn Transform> {
        match self {
            TransformEntry::Any(transform) | TransformEntry::Extension { transform, .. } => {
                transform
            }
        }
    }
}

impl fmt::Debug for TransformEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformEntry::Any(t) => f.debug_tuple("Any").field(&t.name()).finish(),
            TransformEntry::Extension { ext, transform } => f
                .debug_struct("Extension")
                .field("ext", ext)
                .field("transform", &transform.name())
                .finish(),
        }
    }
}

/// Ordered transform registrations.
#[derive(Debug, Clone, Default)]
pub struct TransformChain {
    entries: Vec<TransformEntry>,
}

impl TransformChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: TransformEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every applicable transform over `source`, awaiting each in turn.
    ///
    /// The record's `id` decides which extension-bound entries apply.
    pub async fn apply(&self, mut source: String, record: &mut ModuleRecord) -> Result<String> {
        let path = record.id.clone();
        let ext = Path::new(&path).extension().and_then(|ext| ext.to_str());

        for entry in self.entries.iter().filter(|entry| entry.applies_to(ext)) {
            let transform = entry.transform();
            source = transform
                .transform(source, record)
                .await
                .map_err(|source| Error::TransformFailure {
                    path: path.clone(),
                    transform: transform.name().to_string(),
                    source,
                })?
                .unwrap_or_default();
        }

        Ok(source)
    }
}
