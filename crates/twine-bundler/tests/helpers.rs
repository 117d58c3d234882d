//! Shared test utilities for twine-bundler tests

#![allow(dead_code, clippy::disallowed_methods)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use twine_bundler::{BuildOutput, Builder, PackedRecord};
use twine_graph::MemoryRuntime;

/// Project root used by in-memory fixtures.
pub const ROOT: &str = "/p";

/// An in-memory project rooted at `/p`.
pub fn memory_project(files: &[(&str, &str)]) -> Arc<MemoryRuntime> {
    let runtime = MemoryRuntime::new(ROOT);
    for (path, content) in files {
        runtime.add_file(Path::new(ROOT).join(path), *content);
    }
    Arc::new(runtime)
}

/// A builder for `/p/<entry>` running against `runtime`.
pub fn memory_builder(runtime: &Arc<MemoryRuntime>, entry: &str) -> Builder {
    Builder::new(Path::new(ROOT).join(entry)).runtime(runtime.clone())
}

/// Write fixture files below `root`, creating directories as needed.
pub fn write_project(root: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let path = root.join(path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

/// Integer id assigned to `path` in this build.
pub fn id_of(output: &BuildOutput, path: &str) -> u32 {
    output
        .ids
        .get(path)
        .unwrap_or_else(|| panic!("{path} was not packed"))
}

/// The packed record of `path`.
pub fn record<'a>(output: &'a BuildOutput, path: &str) -> &'a PackedRecord {
    let id = id_of(output, path);
    output
        .records
        .iter()
        .find(|record| record.id == id)
        .unwrap_or_else(|| panic!("no record with id {id}"))
}

/// Evaluate `artifact` in a bare JavaScript context and return `expr` as a
/// string. The loader is bound to `js` and `out` is an empty array modules
/// may push to. The context has no `require` and no file access.
pub fn run_artifact(artifact: &str, expr: &str) -> String {
    use boa_engine::{Context, Source};

    let mut context = Context::default();
    let script = format!("var out = [];\nvar js = {artifact};\n{expr}");
    let value = context
        .eval(Source::from_bytes(&script))
        .unwrap_or_else(|e| panic!("artifact failed to run: {e}\n{artifact}"));
    value
        .to_string(&mut context)
        .unwrap()
        .to_std_string_escaped()
}
