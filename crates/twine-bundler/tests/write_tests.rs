//! Builds against the real filesystem

#![allow(clippy::disallowed_methods)]

mod helpers;

use std::fs;

use helpers::write_project;
use tempfile::TempDir;
use twine_bundler::Builder;
use twine_config::ConfigDiscovery;

#[tokio::test]
async fn writes_the_artifact_relative_to_the_root() {
    let dir = TempDir::new().unwrap();
    write_project(
        dir.path(),
        &[
            ("index.js", "require('./lib/');"),
            ("lib/index.js", "module.exports = 1;"),
        ],
    );

    let output = Builder::new(dir.path().join("index.js"))
        .to("build/build.js")
        .build()
        .await
        .unwrap();

    let written = output.written_to.clone().unwrap();
    assert_eq!(written, dir.path().join("build/build.js"));
    assert_eq!(fs::read_to_string(written).unwrap(), output.artifact);
    assert_eq!(output.records.len(), 2);
}

#[tokio::test]
async fn builds_from_a_discovered_config() {
    let dir = TempDir::new().unwrap();
    write_project(
        dir.path(),
        &[
            (
                "twine.toml",
                r#"
entry = "src/main.js"
root = "."
out = "dist/app.js"
development = true
cache_file = ".twine/cache.json"
"#,
            ),
            ("src/main.js", "require('/src/dep');"),
            ("src/dep.js", "module.exports = 'dep';"),
        ],
    );

    let config = ConfigDiscovery::new(dir.path()).load().unwrap();
    let output = Builder::from_config(&config).build().await.unwrap();

    assert_eq!(output.records.len(), 2);
    assert!(output.artifact.contains("// "));
    assert!(dir.path().join("dist/app.js").is_file());
    assert!(dir.path().join(".twine/cache.json").is_file());
}

#[tokio::test]
async fn package_dependencies_resolve_on_disk() {
    let dir = TempDir::new().unwrap();
    write_project(
        dir.path(),
        &[
            ("index.js", "require('pad');"),
            ("components/mapping.json", r#"{ "app": ["pad@1.0.0"] }"#),
            ("components/pad@1.0.0/component.json", r#"{ "main": "lib/pad.js" }"#),
            ("components/pad@1.0.0/lib/pad.js", "module.exports = 'pad';"),
        ],
    );

    let output = Builder::new(dir.path().join("index.js")).build().await.unwrap();

    let pad = dir.path().join("components/pad@1.0.0/lib/pad.js");
    assert!(output.ids.get(&pad.to_string_lossy()).is_some());
}
