//! Package context inference.
//!
//! Bare requests are looked up in the dependency mapping under the package
//! context of the requiring file. Installed components live in directories
//! named by their slug, so the default resolver reads the context out of the
//! file's path.

use std::fmt::Debug;
use std::path::Path;

use regex::Regex;

/// Maps a requiring file to its package context.
pub trait ContextResolver: Send + Sync + Debug {
    /// The context owning `file`, or `None` when the file belongs to no
    /// package (the root project context then applies).
    fn context_for(&self, file: &str) -> Option<String>;
}

const SLUG_SEGMENT: &str = r"^[\w.-]+@[^/\\]+$";

/// Uses the innermost `name@version` directory in the file's path.
#[derive(Debug, Clone)]
pub struct SlugContextResolver {
    pattern: Regex,
}

impl SlugContextResolver {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(SLUG_SEGMENT)?,
        })
    }
}

impl ContextResolver for SlugContextResolver {
    fn context_for(&self, file: &str) -> Option<String> {
        Path::new(file)
            .parent()?
            .components()
            .rev()
            .filter_map(|component| component.as_os_str().to_str())
            .find(|segment| self.pattern.is_match(segment))
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn innermost_slug_directory_wins() {
        let resolver = SlugContextResolver::new().unwrap();
        assert_eq!(
            resolver
                .context_for("/p/components/pad-component@1.0.0/index.js")
                .as_deref(),
            Some("pad-component@1.0.0")
        );
        assert_eq!(
            resolver
                .context_for("/p/components/a@1.0.0/vendor/b.c@2.0.0-beta/lib/x.js")
                .as_deref(),
            Some("b.c@2.0.0-beta")
        );
    }

    #[test]
    fn files_outside_components_have_no_context() {
        let resolver = SlugContextResolver::new().unwrap();
        assert_eq!(resolver.context_for("/p/lib/index.js"), None);
        assert_eq!(resolver.context_for("/p/me@home.js"), None);
        assert_eq!(resolver.context_for("events"), None);
    }
}
