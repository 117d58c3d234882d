//! Tests for config file discovery and loading

#![allow(clippy::disallowed_methods)]

use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;
use twine_config::{ConfigDiscovery, ConfigError, discover};

#[test]
fn discovers_twine_toml() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("twine.toml"),
        r#"
entry = "src/main.js"
concurrency = 4
development = true
cache_file = ".twine-cache.json"

[resolve]
extension = "mjs"
root_context = "app"
"#,
    )
    .unwrap();

    let discovery = ConfigDiscovery::new(dir.path());
    let found = discovery.find().unwrap();
    assert_eq!(found.file_name().unwrap(), "twine.toml");

    let config = discovery.load().unwrap();
    assert_eq!(config.entry, dir.path().join("src/main.js"));
    assert_eq!(config.concurrency, 4);
    assert!(config.development);
    assert_eq!(config.cache_file, Some(PathBuf::from(".twine-cache.json")));
    assert_eq!(config.resolve.extension, "mjs");
    assert_eq!(config.resolve.root_context.as_deref(), Some("app"));

    // Untouched keys keep their defaults.
    assert_eq!(config.resolve.require_name, "require");
    assert_eq!(config.manifest, "component.json");
}

#[test]
fn missing_config_is_not_found() {
    let dir = TempDir::new().unwrap();
    let discovery = ConfigDiscovery::new(dir.path());

    assert!(discovery.find().is_none());
    assert!(matches!(discovery.load(), Err(ConfigError::NotFound(_))));
}

#[test]
fn load_or_default_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let config = discover(dir.path()).unwrap();

    assert_eq!(config.entry, dir.path().join("index.js"));
    assert_eq!(config.concurrency, 10);
    assert_eq!(config.project_root(), dir.path());
}

#[test]
fn invalid_values_are_rejected_on_load() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("twine.toml"), "concurrency = 0\n").unwrap();

    let err = ConfigDiscovery::new(dir.path()).load().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "concurrency"));
}

#[test]
fn malformed_toml_is_a_load_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("twine.toml"), "concurrency = \"many\"\n").unwrap();

    let err = ConfigDiscovery::new(dir.path()).load().unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}
