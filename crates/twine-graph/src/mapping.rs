//! Declared dependency mapping.
//!
//! The mapping is produced outside the bundler (typically by the installer that
//! fetched the components) and describes, for each package context, the
//! ordered list of `name@version` slugs that context may require by bare name.
//!
//! Two on-disk layouts are accepted for each context value:
//!
//! ```json
//! {
//!   "app": ["pad-component@1.0.0", "emitter@1.1.1"],
//!   "pad-component@1.0.0": { "deps": ["emitter@1.1.1"] }
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

/// Error returned for a malformed `name@version` slug.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid slug '{slug}': expected name@version")]
pub struct SlugError {
    pub slug: String,
}

/// A `name@version` package identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug {
    name: String,
    version: String,
}

impl Slug {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// The part before `@`, matched against bare requests.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || SlugError {
            slug: s.to_string(),
        };

        // Skip the first character so a leading '@' is never taken as the separator.
        let (at, _) = s
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '@')
            .ok_or_else(err)?;
        let (name, version) = (&s[..at], &s[at + 1..]);

        if name.is_empty() || version.is_empty() || name.contains('/') || version.contains('/') {
            return Err(err());
        }

        Ok(Self::new(name, version))
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.to_string()
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MappingEntry {
    Slugs(Vec<Slug>),
    Manifest { deps: Vec<Slug> },
}

impl From<MappingEntry> for Vec<Slug> {
    fn from(entry: MappingEntry) -> Self {
        match entry {
            MappingEntry::Slugs(slugs) | MappingEntry::Manifest { deps: slugs } => slugs,
        }
    }
}

/// Package context to declared dependency slugs.
///
/// Context order is preserved; the first context is the default one used for
/// files that belong to no `name@version` directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "IndexMap<String, MappingEntry>")]
pub struct DependencyMapping {
    contexts: IndexMap<String, Vec<Slug>>,
}

impl From<IndexMap<String, MappingEntry>> for DependencyMapping {
    fn from(raw: IndexMap<String, MappingEntry>) -> Self {
        Self {
            contexts: raw
                .into_iter()
                .map(|(context, entry)| (context, entry.into()))
                .collect(),
        }
    }
}

impl Serialize for DependencyMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.contexts.serialize(serializer)
    }
}

impl DependencyMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a mapping from JSON text.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Declare the dependencies of a context, replacing any previous list.
    pub fn insert(&mut self, context: impl Into<String>, slugs: impl IntoIterator<Item = Slug>) {
        self.contexts
            .insert(context.into(), slugs.into_iter().collect());
    }

    /// Builder-style variant of [`DependencyMapping::insert`].
    pub fn with(mut self, context: impl Into<String>, slugs: impl IntoIterator<Item = Slug>) -> Self {
        self.insert(context, slugs);
        self
    }

    pub fn get(&self, context: &str) -> Option<&[Slug]> {
        self.contexts.get(context).map(Vec::as_slice)
    }

    pub fn contains_context(&self, context: &str) -> bool {
        self.contexts.contains_key(context)
    }

    /// The first declared context.
    pub fn default_context(&self) -> Option<&str> {
        self.contexts.keys().next().map(String::as_str)
    }

    /// First slug of `context` whose name equals `name`.
    pub fn find_dependency(&self, context: &str, name: &str) -> Option<&Slug> {
        self.get(context)?.iter().find(|slug| slug.name() == name)
    }

    pub fn contexts(&self) -> impl Iterator<Item = &str> {
        self.contexts.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
