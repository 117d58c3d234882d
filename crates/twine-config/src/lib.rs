//! # twine-config
//!
//! Layered configuration for twine builds.
//!
//! Values are merged in this order, later sources winning:
//!
//! 1. built-in defaults ([`TwineConfig::default`])
//! 2. `twine.toml` in the project root
//! 3. `TWINE_*` environment variables (`__` separates nested keys, e.g.
//!    `TWINE_RESOLVE__EXTENSION=mjs`)
//!
//! Transforms are code, not configuration; they are registered on the
//! bundler's `Builder` directly.

pub mod config;
pub mod discovery;
pub mod error;
pub mod validation;

pub use config::{ResolveConfig, TwineConfig};
pub use discovery::{CONFIG_FILE, ConfigDiscovery, discover};
pub use error::{ConfigError, Result};
pub use validation::{ConfigValidator, FilesystemValidator, SchemaValidator};
