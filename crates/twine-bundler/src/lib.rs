#![cfg_attr(docsrs, feature(doc_cfg))]

//! # twine-bundler
//!
//! Crawls the CommonJS dependency closure of a single entry file and packs
//! every module into one self-contained script.
//!
//! ## Quick Start
//!
//! ```no_run
//! use twine_bundler::Builder;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let output = Builder::new("./app/index.js")
//!     .development(true)
//!     .include("events", "module.exports = {};")
//!     .to("build/build.js")
//!     .build()
//!     .await?;
//!
//! println!("packed {} modules", output.records.len());
//! # Ok(()) }
//! ```
//!
//! ## Pipeline
//!
//! ```text
//!   entry ─▶ Crawler ─┬─▶ TransformChain ─▶ RequestExtractor ─▶ Resolver
//!                     │                                            │
//!                     └───────────── next frontier ◀───────────────┘
//!                                       │
//!                         ModuleGraph ─▶ IdTable::remap ─▶ Packer ─▶ artifact
//! ```

// Re-export the graph foundation
pub use twine_graph::{
    DependencyMapping, ID_BASE, IdTable, ModuleGraph, ModuleRecord, PackedRecord, Runtime,
    RuntimeError, Slug,
};

#[cfg(not(target_family = "wasm"))]
pub use twine_graph::NativeRuntime;

pub mod builder;
pub mod cache;
pub mod crawler;
pub mod extract;
pub mod pack;
pub mod parallel;
pub mod resolver;
pub mod transform;

pub use builder::{BuildOutput, Builder};
pub use cache::ModuleCache;
pub use extract::RequestExtractor;
pub use pack::Packer;
pub use resolver::{ContextResolver, ResolveOptions, Resolver, SlugContextResolver};
pub use transform::{Transform, TransformChain, TransformEntry, transform_fn};

// Logging utilities (optional, enabled with "logging" feature)
#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub mod logging;

#[cfg(feature = "logging")]
#[cfg_attr(docsrs, doc(cfg(feature = "logging")))]
pub use logging::{LogLevel, init_logging, init_logging_from_env};

use std::path::PathBuf;

/// Error types for twine builds.
///
/// Every variant is fatal to the build that raised it; no partial artifact is
/// produced.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A request matched no file, virtual module or declared dependency.
    #[error("cannot resolve '{request}' from {from}: {reason}")]
    UnresolvedDependency {
        request: String,
        from: String,
        reason: String,
    },

    /// The requesting file's package context is not in the dependency mapping.
    #[error(
        "unknown package context {} for '{request}' required from {from}",
        .context.as_deref().unwrap_or("<none>")
    )]
    UnresolvedContext {
        request: String,
        from: String,
        context: Option<String>,
    },

    /// A transform returned an error.
    #[error("transform '{transform}' failed on {path}: {source}")]
    TransformFailure {
        path: String,
        transform: String,
        source: anyhow::Error,
    },

    /// A file could not be statted, read or written.
    #[error("I/O failure on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: RuntimeError,
    },

    /// A component manifest exists but is not valid JSON.
    #[error("invalid manifest {}: {reason}", .path.display())]
    InvalidManifest { path: PathBuf, reason: String },

    /// The dependency mapping file exists but could not be parsed.
    #[error("invalid dependency mapping {}: {reason}", .path.display())]
    InvalidMapping { path: PathBuf, reason: String },

    /// Invalid builder configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error from configuration loading.
    #[error(transparent)]
    Config(#[from] twine_config::ConfigError),
}

/// Result type alias for twine-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: RuntimeError) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::UnresolvedDependency { .. } => "UNRESOLVED_DEPENDENCY",
            Error::UnresolvedContext { .. } => "UNRESOLVED_CONTEXT",
            Error::TransformFailure { .. } => "TRANSFORM_FAILURE",
            Error::Io { .. } => "IO_ERROR",
            Error::InvalidManifest { .. } => "INVALID_MANIFEST",
            Error::InvalidMapping { .. } => "INVALID_MAPPING",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Config(_) => "CONFIG_ERROR",
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::UnresolvedDependency { request, .. } if request.starts_with('.') => {
                Some(Box::new(format!(
                    "Check that '{}' exists as a file or as a directory with an index file.",
                    request
                )))
            }
            Error::UnresolvedDependency { request, .. } => Some(Box::new(format!(
                "Add a '{}@<version>' slug to the requiring package in mapping.json, or include() it as a virtual module.",
                request
            ))),
            Error::UnresolvedContext {
                context: Some(context),
                ..
            } => Some(Box::new(format!(
                "Add a '{}' entry to mapping.json listing the dependencies it may require.",
                context
            ))),
            Error::UnresolvedContext { context: None, .. } => Some(Box::new(
                "The dependency mapping is empty. Install components or set resolve.root_context.",
            )),
            Error::TransformFailure { transform, .. } => Some(Box::new(format!(
                "The '{}' transform rejected this file. Fix the source or the transform.",
                transform
            ))),
            Error::InvalidManifest { .. } => Some(Box::new(
                "The component manifest must be a JSON object; 'main' names its entry file.",
            )),
            Error::InvalidMapping { .. } => Some(Box::new(
                "mapping.json must map each package context to an array of name@version slugs.",
            )),
            Error::InvalidConfig(msg) => Some(Box::new(format!(
                "Check your builder options.\nError: {}",
                msg
            ))),
            _ => None,
        }
    }
}
