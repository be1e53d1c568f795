// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Keyward configuration system.

use figment::providers::{Format, Serialized, Toml};
use figment::{Figment, Jail};
use keyward_config::diagnostic::ConfigError;
use keyward_config::model::KeywardConfig;
use keyward_config::{load_and_validate_path, load_and_validate_str, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[logging]
level = "debug"

[vault]
kdf_memory_cost = 131072
kdf_iterations = 4
kdf_parallelism = 2
detached_hmac = false
min_secret_length = 24

[rotation]
max_age_in_days = 30
warning_threshold_in_days = 5
enable_auto_rotation = true

[storage]
metadata_dir = "/var/lib/keyward"
metadata_file = "keys.json"
backup_retention = 5

[environment]
env_dir = "/srv/envs"
base_env_file = "base.env"
io_timeout_secs = 10
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.vault.kdf_memory_cost, 131072);
    assert_eq!(config.vault.kdf_iterations, 4);
    assert_eq!(config.vault.kdf_parallelism, 2);
    assert!(!config.vault.detached_hmac);
    assert_eq!(config.vault.min_secret_length, 24);
    assert_eq!(config.rotation.max_age_in_days, 30);
    assert_eq!(config.rotation.warning_threshold_in_days, 5);
    assert!(config.rotation.enable_auto_rotation);
    assert_eq!(
        config.storage.metadata_path(),
        std::path::PathBuf::from("/var/lib/keyward/keys.json")
    );
    assert_eq!(config.storage.backup_retention, 5);
    assert_eq!(
        config.environment.base_env_path(),
        std::path::PathBuf::from("/srv/envs/base.env")
    );
    assert_eq!(config.environment.io_timeout().as_secs(), 10);
}

#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.vault.kdf_memory_cost, 65536);
    assert_eq!(config.vault.kdf_iterations, 3);
    assert_eq!(config.vault.kdf_parallelism, 4);
    assert!(config.vault.detached_hmac);
    assert_eq!(config.rotation.max_age_in_days, 90);
    assert_eq!(config.rotation.warning_threshold_in_days, 7);
    assert!(!config.rotation.enable_auto_rotation);
    assert_eq!(config.storage.metadata_file, "keyMetadata.json");
    assert_eq!(config.storage.backup_retention, 20);
    assert_eq!(config.environment.base_env_file, ".env");
    assert_eq!(config.environment.io_timeout_secs, 30);
}

#[test]
fn absolute_credential_paths_are_not_rebased() {
    let config = KeywardConfig::default();
    assert_eq!(
        config.environment.resolve("/tmp/uat.env"),
        std::path::PathBuf::from("/tmp/uat.env")
    );
    assert_eq!(
        config.environment.resolve("uat.env"),
        std::path::PathBuf::from("envs/uat.env")
    );
}

#[test]
fn unknown_field_is_reported_with_suggestion() {
    let toml = r#"
[rotation]
max_age_in_dyas = 30
"#;

    let errors = load_and_validate_str(toml).expect_err("typo should fail");
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key,
                suggestion,
                valid_keys,
                ..
            } => Some((key.clone(), suggestion.clone(), valid_keys.clone())),
            _ => None,
        })
        .expect("should produce an unknown key error");

    assert_eq!(unknown.0, "max_age_in_dyas");
    assert_eq!(unknown.1.as_deref(), Some("max_age_in_days"));
    assert!(unknown.2.contains("warning_threshold_in_days"));
}

#[test]
fn unknown_top_level_section_is_rejected() {
    let toml = r#"
[vaults]
kdf_iterations = 3
"#;
    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn invalid_type_is_reported() {
    let toml = r#"
[storage]
backup_retention = "many"
"#;

    let errors = load_and_validate_str(toml).expect_err("string retention should fail");
    let rendered = errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n");
    assert!(
        rendered.contains("invalid type") || rendered.contains("backup_retention"),
        "got: {rendered}"
    );
}

#[test]
fn rotation_invariant_is_enforced_at_load() {
    let toml = r#"
[rotation]
max_age_in_days = 14
warning_threshold_in_days = 20
"#;

    let errors = load_and_validate_str(toml).expect_err("threshold above max age should fail");
    assert!(errors.iter().any(|e| matches!(
        e,
        ConfigError::Validation { message } if message.contains("must be less than")
    )));
}

#[test]
fn explicit_overrides_merge_over_defaults() {
    let config: KeywardConfig = Figment::new()
        .merge(Serialized::defaults(KeywardConfig::default()))
        .merge(Toml::string("[storage]\nbackup_retention = 3\n"))
        .merge(("environment.io_timeout_secs", 5))
        .extract()
        .expect("should merge override");

    assert_eq!(config.storage.backup_retention, 3);
    assert_eq!(config.environment.io_timeout_secs, 5);
}

#[test]
fn env_vars_override_file_values() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "keyward.toml",
            "[rotation]\nmax_age_in_days = 60\n[storage]\nmetadata_dir = \"from-file\"\n",
        )?;
        jail.set_env("KEYWARD_ROTATION_MAX_AGE_IN_DAYS", "45");
        jail.set_env("KEYWARD_STORAGE_METADATA_DIR", "from-env");

        let path = jail.directory().join("keyward.toml");
        let config = load_and_validate_path(&path).expect("config should load");
        assert_eq!(config.rotation.max_age_in_days, 45);
        assert_eq!(config.storage.metadata_dir, "from-env");
        Ok(())
    });
}

#[test]
fn config_error_renders_with_miette() {
    use miette::{Diagnostic, GraphicalReportHandler};

    let error = ConfigError::UnknownKey {
        key: "detached_hmca".to_string(),
        suggestion: Some("detached_hmac".to_string()),
        valid_keys: "kdf_memory_cost, detached_hmac".to_string(),
        span: None,
        src: None,
    };

    assert!(error.code().is_some());
    let help = error.help().expect("help text").to_string();
    assert!(help.contains("did you mean `detached_hmac`"));

    let mut buf = String::new();
    GraphicalReportHandler::new()
        .render_report(&mut buf, &error)
        .expect("should render");
    assert!(buf.contains("detached_hmca"));
}

#[test]
fn config_file_on_disk_is_validated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("keyward.toml");
    std::fs::write(&path, "[environment]\nio_timeout_secs = 0\n").unwrap();

    let errors = load_and_validate_path(&path).expect_err("zero timeout should fail");
    assert!(errors.iter().any(|e| e.to_string().contains("io_timeout_secs")));
}
