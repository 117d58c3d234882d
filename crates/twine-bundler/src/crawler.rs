//! Graph crawling.
//!
//! The crawl works in waves over a frontier of identifiers that have not been
//! visited yet:
//!
//! 1. drop identifiers already in the graph; injected modules are moved in
//!    directly
//! 2. generate a record for each remaining file, at most `concurrency` at once
//! 3. the next frontier is every dependency of this wave minus the graph
//!
//! Step 3 is what makes cycles terminate: the graph only grows and a visited
//! file is never queued again.

use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;
use twine_graph::{ModuleGraph, ModuleRecord, Runtime, RuntimeError};

use crate::cache::ModuleCache;
use crate::extract::RequestExtractor;
use crate::parallel::run_bounded;
use crate::resolver::Resolver;
use crate::transform::TransformChain;
use crate::{Error, Result};

/// The first request that queued a module. The entry has none.
#[derive(Debug, Clone)]
struct Origin {
    request: String,
    from: String,
}

/// Everything one crawl reads. Nothing here is mutated while crawling.
pub struct Crawler<'a> {
    pub runtime: &'a dyn Runtime,
    pub resolver: &'a Resolver,
    pub transforms: &'a TransformChain,
    pub extractor: &'a RequestExtractor,
    pub cache: &'a ModuleCache,
    pub injected: &'a IndexMap<String, ModuleRecord>,
    pub concurrency: usize,
}

impl Crawler<'_> {
    /// Crawl the dependency closure of `entry`.
    ///
    /// Fails on the first generation error; no partial graph is returned.
    pub async fn crawl(&self, entry: &str) -> Result<ModuleGraph> {
        let mut graph = ModuleGraph::new();
        let mut frontier: IndexMap<String, Option<Origin>> = IndexMap::new();
        frontier.insert(entry.to_string(), None);
        let mut wave = 0usize;

        while !frontier.is_empty() {
            wave += 1;
            let mut fresh = Vec::with_capacity(frontier.len());
            for (id, origin) in frontier {
                if graph.contains(&id) {
                    continue;
                }
                match self.injected.get(&id) {
                    Some(record) => {
                        graph.insert(record.clone());
                    }
                    None => fresh.push((id, origin)),
                }
            }

            debug!(wave, modules = fresh.len(), "generating wave");
            let records = run_bounded(fresh, self.concurrency, |(id, origin)| {
                self.generate(id, origin, entry)
            })
            .await?;

            let mut next = IndexMap::new();
            for record in records {
                for (request, target) in &record.dependencies {
                    next.entry(target.clone()).or_insert_with(|| {
                        Some(Origin {
                            request: request.clone(),
                            from: record.id.clone(),
                        })
                    });
                }
                graph.insert(record);
            }

            next.retain(|id, _| !graph.contains(id));
            frontier = next;
        }

        Ok(graph)
    }

    /// Generate the record of one file: stat, then either reuse the source of
    /// a fresh cached record or read and transform, then extract and resolve.
    async fn generate(
        &self,
        id: String,
        origin: Option<Origin>,
        entry: &str,
    ) -> Result<ModuleRecord> {
        let path = Path::new(&id);
        let is_entry = id == entry;
        let missing = |e: RuntimeError| match &origin {
            Some(origin) if e.is_not_found() => Error::UnresolvedDependency {
                request: origin.request.clone(),
                from: origin.from.clone(),
                reason: format!("{} does not exist", path.display()),
            },
            _ => Error::io(path, e),
        };

        let metadata = self.runtime.metadata(path).await.map_err(missing)?;

        let mut record = match self.cache.fresh(&id, metadata.modified) {
            Some(cached) => {
                debug!(id = %id, "reusing cached module");
                let mut record = cached.clone();
                record.is_entry = is_entry;
                record
            }
            None => {
                let source = self.runtime.read_to_string(path).await.map_err(missing)?;
                let mut record = ModuleRecord::new(id.as_str(), is_entry, metadata.modified);
                let source = self.transforms.apply(source, &mut record).await?;
                record.dependencies = self
                    .extractor
                    .extract(&source)
                    .into_iter()
                    .map(|request| (request, String::new()))
                    .collect();
                record.source = source;
                record
            }
        };

        // Cached targets were resolved against an earlier build's virtual
        // modules and mapping, so every request is resolved again here.
        for (request, target) in record.dependencies.iter_mut() {
            *target = self.resolver.resolve(request, &id).await?;
        }

        debug!(
            id = %record.id,
            requests = ?record.dependencies.keys().collect::<Vec<_>>(),
            "generated module"
        );

        Ok(record)
    }
}
