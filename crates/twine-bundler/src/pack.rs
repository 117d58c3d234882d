//! Artifact packing.
//!
//! The artifact is a single expression:
//!
//! ```text
//! (function outer(modules, cache, entries){ ...loader... })(
//!   { 1: [function(require,module,exports){ <src> }, {"./b": 2}], ... },
//!   {},
//!   [1]
//! )
//! ```
//!
//! Evaluating it runs every entry module and yields the loader, so `js(1)`
//! returns the exports of module 1. Each module's `require` looks the literal
//! request up in its own dependency table, which is why literals are the keys.

use std::fmt::Write as _;

use twine_graph::PackedRecord;

const PRELUDE: &str = r#"(function outer(modules, cache, entries){
  var previousRequire = typeof require == "function" && require;

  function newRequire(name, jumped){
    if (!cache[name]) {
      if (!modules[name]) {
        var currentRequire = typeof require == "function" && require;
        if (!jumped && currentRequire) return currentRequire(name, true);
        if (previousRequire) return previousRequire(name, true);
        var err = new Error("Cannot find module '" + name + "'");
        err.code = "MODULE_NOT_FOUND";
        throw err;
      }
      var m = cache[name] = { exports: {} };
      modules[name][0].call(m.exports, function(x){
        var id = modules[name][1][x];
        return newRequire(id ? id : x);
      }, m, m.exports, outer, modules, cache, entries);
    }
    return cache[name].exports;
  }

  for (var i = 0; i < entries.length; i++) newRequire(entries[i]);

  return newRequire;
})"#;

/// Serializes remapped records into the artifact.
#[derive(Debug, Clone, Copy, Default)]
pub struct Packer {
    development: bool,
}

impl Packer {
    /// `development` annotates each module with its original identifier and
    /// pretty-prints dependency tables. Module ids and order are unaffected.
    pub fn new(development: bool) -> Self {
        Self { development }
    }

    /// Pack `records` with `entries` auto-invoked on load.
    ///
    /// Modules are emitted in ascending id order so equal inputs give equal
    /// bytes. `origins` maps an id back to its path for development comments.
    pub fn pack<'a>(
        &self,
        records: &[PackedRecord],
        entries: &[u32],
        origins: impl Fn(u32) -> Option<&'a str>,
    ) -> String {
        let mut sorted: Vec<&PackedRecord> = records.iter().collect();
        sorted.sort_by_key(|record| record.id);

        let mut out = String::with_capacity(
            PRELUDE.len() + records.iter().map(|r| r.source.len() + 64).sum::<usize>(),
        );
        out.push_str(PRELUDE);
        out.push_str("({");

        for (index, record) in sorted.iter().enumerate() {
            if index > 0 {
                out.push(',');
            }
            out.push('\n');

            if self.development {
                if let Some(origin) = origins(record.id) {
                    let _ = writeln!(out, "// {}", origin.replace('\n', " "));
                }
            }

            let deps = self.dependency_table(record);
            let _ = write!(
                out,
                "{}:[function(require,module,exports){{\n{}\n}},{}]",
                record.id, record.source, deps
            );
        }

        let entries = entries
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let _ = write!(out, "\n}},{{}},[{}])\n", entries);
        out
    }

    fn dependency_table(&self, record: &PackedRecord) -> String {
        let table = if self.development {
            serde_json::to_string_pretty(&record.dependencies)
        } else {
            serde_json::to_string(&record.dependencies)
        };
        // A map of string keys to integers always serializes.
        table.unwrap_or_else(|_| "{}".to_string())
    }
}
