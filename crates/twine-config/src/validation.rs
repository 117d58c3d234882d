//! Config validation strategies.
//!
//! Schema checks never touch the filesystem; [`FilesystemValidator`] adds
//! existence checks for command-line use.

use crate::config::TwineConfig;
use crate::error::{ConfigError, Result};

/// A validation strategy for [`TwineConfig`].
pub trait ConfigValidator {
    fn validate(&self, config: &TwineConfig) -> Result<()>;
}

/// Schema-only validation.
///
/// ```
/// use twine_config::{TwineConfig, validation::{ConfigValidator, SchemaValidator}};
///
/// SchemaValidator.validate(&TwineConfig::new("index.js")).unwrap();
/// ```
pub struct SchemaValidator;

impl ConfigValidator for SchemaValidator {
    fn validate(&self, config: &TwineConfig) -> Result<()> {
        if config.entry.as_os_str().is_empty() {
            return Err(ConfigError::NoEntry);
        }

        if config.concurrency == 0 {
            return Err(invalid("concurrency", "use a value of at least 1"));
        }

        if config.manifest.trim().is_empty() {
            return Err(invalid("manifest", "name the per-component manifest file"));
        }

        let resolve = &config.resolve;
        if !is_identifier(&resolve.require_name) {
            return Err(invalid(
                "resolve.require_name",
                "must be a JavaScript identifier such as 'require'",
            ));
        }

        if resolve.extension.is_empty() || resolve.extension.starts_with('.') {
            return Err(invalid(
                "resolve.extension",
                "give the extension without a leading dot, e.g. 'js'",
            ));
        }

        if resolve.index.is_empty() || resolve.index.contains('/') {
            return Err(invalid("resolve.index", "must be a plain file name"));
        }

        Ok(())
    }
}

/// Schema validation plus a check that the entry file exists.
pub struct FilesystemValidator;

impl ConfigValidator for FilesystemValidator {
    #[allow(clippy::disallowed_methods)]
    fn validate(&self, config: &TwineConfig) -> Result<()> {
        SchemaValidator.validate(config)?;

        if !config.entry.is_file() {
            return Err(ConfigError::EntryNotFound(config.entry.clone()));
        }

        Ok(())
    }
}

fn invalid(field: &str, hint: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        hint: hint.to_string(),
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
