// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./keyward.toml` > `~/.config/keyward/keyward.toml` > `/etc/keyward/keyward.toml`,
//! with `KEYWARD_` environment variable overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::KeywardConfig;

/// Top-level sections, used to turn `KEYWARD_VAULT_KDF_ITERATIONS` into `vault.kdf_iterations`.
const SECTIONS: &[&str] = &["logging", "vault", "rotation", "storage", "environment"];

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<KeywardConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string over the compiled defaults.
///
/// Environment variables are ignored so tests stay hermetic.
pub fn load_config_from_str(toml_content: &str) -> Result<KeywardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeywardConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KeywardConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeywardConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(KeywardConfig::default()))
        .merge(Toml::file("/etc/keyward/keyward.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("keyward/keyward.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("keyward.toml"))
        .merge(env_provider())
}

/// Environment provider mapping `KEYWARD_<SECTION>_<FIELD>` to `section.field`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `KEYWARD_STORAGE_METADATA_DIR` maps to `storage.metadata_dir`.
fn env_provider() -> Env {
    Env::prefixed("KEYWARD_").map(|key| map_env_key(key.as_str()).into())
}

pub(crate) fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in SECTIONS {
        let prefix = format!("{section}_");
        if let Some(field) = key.strip_prefix(&prefix) {
            return format!("{section}.{field}");
        }
    }
    key
}
