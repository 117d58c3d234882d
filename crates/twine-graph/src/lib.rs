//! # twine-graph
//!
//! Pure data structures for the twine module graph.
//!
//! This crate holds everything the bundler passes between its stages without
//! knowing how the data was produced:
//!
//! - [`ModuleRecord`]: one generated module, generic over its identifier space
//!   (`String` paths while crawling, `u32` ids once remapped)
//! - [`ModuleGraph`]: the ordered visited set of a single build
//! - [`IdTable`]: the path to integer identifier table used by the remap pass
//! - [`DependencyMapping`]: which `name@version` slugs a package context may
//!   require by bare name
//! - [`Runtime`]: the async filesystem abstraction every I/O call goes through
//!
//! ## Architecture
//!
//! ```text
//!   Runtime ──▶ (bundler crawl) ──▶ ModuleGraph<ModuleRecord<String>>
//!                                          │
//!                                          ▼  IdTable::remap
//!                                   Vec<ModuleRecord<u32>> ──▶ (pack)
//! ```

pub mod graph;
pub mod ids;
pub mod mapping;
pub mod record;
pub mod runtime;

pub use graph::ModuleGraph;
pub use ids::{ID_BASE, IdTable};
pub use mapping::{DependencyMapping, Slug, SlugError};
pub use record::{ModuleRecord, PackedRecord};

pub use runtime::{FileMetadata, Runtime, RuntimeError, RuntimeResult};

#[cfg(not(target_family = "wasm"))]
pub use runtime::native::NativeRuntime;

#[cfg(any(test, feature = "test-utils"))]
pub use runtime::memory::MemoryRuntime;
