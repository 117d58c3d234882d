//! File-based config discovery.
//!
//! Looks for `twine.toml` in a project directory and layers it between the
//! built-in defaults and `TWINE_*` environment variables.

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use tracing::debug;

use crate::config::TwineConfig;
use crate::error::{ConfigError, Result};
use crate::validation::{ConfigValidator, SchemaValidator};

/// Conventional config file name.
pub const CONFIG_FILE: &str = "twine.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "TWINE_";

/// Configuration discovery rooted at a project directory.
///
/// # Example
///
/// ```no_run
/// use twine_config::ConfigDiscovery;
///
/// let config = ConfigDiscovery::new(".").load().unwrap();
/// println!("building {}", config.entry.display());
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path of `twine.toml` in the root, if present.
    #[allow(clippy::disallowed_methods)]
    pub fn find(&self) -> Option<PathBuf> {
        let path = self.root.join(CONFIG_FILE);
        path.is_file().then_some(path)
    }

    /// Load the discovered config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if the root has no `twine.toml`.
    pub fn load(&self) -> Result<TwineConfig> {
        let path = self
            .find()
            .ok_or_else(|| ConfigError::NotFound(self.root.clone()))?;
        self.load_from(&path)
    }

    /// Load the config file when present, otherwise defaults plus environment.
    pub fn load_or_default(&self) -> Result<TwineConfig> {
        match self.find() {
            Some(path) => self.load_from(&path),
            None => self.finish(Self::base()),
        }
    }

    /// Load a specific config file. Relative paths inside it are taken
    /// against the discovery root.
    pub fn load_from(&self, path: &Path) -> Result<TwineConfig> {
        debug!(path = %path.display(), "loading twine config");
        self.finish(Self::base().merge(Toml::file(path)))
    }

    fn base() -> Figment {
        Figment::new().merge(Serialized::defaults(TwineConfig::default()))
    }

    fn finish(&self, figment: Figment) -> Result<TwineConfig> {
        let config: TwineConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        let config = config.rebase(&self.root);
        SchemaValidator.validate(&config)?;
        Ok(config)
    }
}

/// Shorthand for `ConfigDiscovery::new(root).load_or_default()`.
pub fn discover(root: impl AsRef<Path>) -> Result<TwineConfig> {
    ConfigDiscovery::new(root).load_or_default()
}
