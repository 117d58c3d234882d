//! Environment overrides layered over twine.toml

use figment::Jail;
use twine_config::ConfigDiscovery;

#[test]
fn env_overrides_file_values() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "twine.toml",
            r#"
concurrency = 4

[resolve]
extension = "mjs"
"#,
        )?;
        jail.set_env("TWINE_CONCURRENCY", "2");
        jail.set_env("TWINE_RESOLVE__EXTENSION", "cjs");

        let config = ConfigDiscovery::new(jail.directory())
            .load()
            .map_err(|e| e.to_string())?;

        assert_eq!(config.concurrency, 2);
        assert_eq!(config.resolve.extension, "cjs");
        Ok(())
    });
}

#[test]
fn env_applies_without_a_config_file() {
    Jail::expect_with(|jail| {
        jail.set_env("TWINE_DEVELOPMENT", "true");
        jail.set_env("TWINE_ENTRY", "app.js");

        let config = ConfigDiscovery::new(jail.directory())
            .load_or_default()
            .map_err(|e| e.to_string())?;

        assert!(config.development);
        assert_eq!(config.entry, jail.directory().join("app.js"));
        Ok(())
    });
}
