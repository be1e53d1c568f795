// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` lays out a throwaway Keyward workspace in a temp directory:
//! a key file with one stored key, tracked metadata, and any number of
//! credential files whose values are already encrypted under that key.
//! Argon2 runs with minimal costs so tests stay fast.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Duration as ChronoDuration;
use keyward_config::KeywardConfig;
use keyward_core::io::write_atomic;
use keyward_core::KeywardError;
use keyward_keys::{KeyLifecycleManager, KeyMetadataStore, StoreKeyRequest};
use keyward_vault::{EncryptionEngine, EnvFile};
use secrecy::{ExposeSecret, SecretString};

/// Key name used when none is configured.
pub const DEFAULT_KEY_NAME: &str = "DEV_SECRET_KEY";

/// Key value used when none is configured.
pub const DEFAULT_KEY_VALUE: &str = "harness-secret-key-value-0001";

enum Seed {
    Encrypted(String, Vec<(String, String)>),
    Raw(String, String),
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    key_name: String,
    key_value: String,
    key_age_days: Option<i64>,
    seeds: Vec<Seed>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            key_name: DEFAULT_KEY_NAME.to_string(),
            key_value: DEFAULT_KEY_VALUE.to_string(),
            key_age_days: None,
            seeds: Vec::new(),
        }
    }

    /// Use a specific key name and value.
    pub fn with_key(mut self, name: &str, value: &str) -> Self {
        self.key_name = name.to_string();
        self.key_value = value.to_string();
        self
    }

    /// Backdate the key's metadata by `days`.
    pub fn with_key_age(mut self, days: i64) -> Self {
        self.key_age_days = Some(days);
        self
    }

    /// A credential file whose values are encrypted under the harness key.
    pub fn with_encrypted_file(mut self, file: &str, values: &[(&str, &str)]) -> Self {
        let values = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.seeds.push(Seed::Encrypted(file.to_string(), values));
        self
    }

    /// A credential file written verbatim.
    pub fn with_raw_file(mut self, file: &str, content: &str) -> Self {
        self.seeds
            .push(Seed::Raw(file.to_string(), content.to_string()));
        self
    }

    /// Build the harness, writing every file and the key's metadata.
    pub async fn build(self) -> Result<TestHarness, KeywardError> {
        let temp_dir = tempfile::TempDir::new()?;
        let root = temp_dir.path();

        let mut config = KeywardConfig::default();
        config.vault.kdf_memory_cost = 1024;
        config.vault.kdf_iterations = 1;
        config.vault.kdf_parallelism = 1;
        config.storage.metadata_dir = root.join(".keyward").display().to_string();
        config.storage.backup_retention = 5;
        config.environment.env_dir = root.join("envs").display().to_string();
        config.environment.io_timeout_secs = 5;

        let engine = EncryptionEngine::new(&config.vault);
        let store = Arc::new(KeyMetadataStore::from_config(&config));
        let lifecycle = KeyLifecycleManager::from_config(Arc::clone(&store), &config)?;
        let key_value = SecretString::from(self.key_value);
        let timeout = config.environment.io_timeout();

        let mut environments = Vec::new();
        let mut variables = Vec::new();
        for seed in &self.seeds {
            match seed {
                Seed::Encrypted(file, values) => {
                    let mut env = EnvFile::default();
                    for (name, plain) in values {
                        let envelope = engine.encrypt(plain, &key_value).await?;
                        env.set(name, &envelope);
                        variables.push(name.clone());
                    }
                    env.save(&config.environment.resolve(file), timeout).await?;
                    environments.push(file.clone());
                }
                Seed::Raw(file, content) => {
                    write_atomic(&config.environment.resolve(file), content.as_bytes(), timeout)
                        .await?;
                }
            }
        }

        lifecycle
            .store_base_environment_key(StoreKeyRequest {
                key_file: config.environment.base_env_path(),
                key_name: self.key_name.clone(),
                key_value: SecretString::from(key_value.expose_secret().to_string()),
                custom_max_age: None,
                rotate: false,
                environments_used_in: environments,
                dependent_variables: variables,
            })
            .await?;

        if let Some(days) = self.key_age_days {
            let key_name = self.key_name.clone();
            store
                .update(move |map| {
                    if let Some(metadata) = map.get_mut(&key_name) {
                        metadata.created_at = metadata.created_at
                            - ChronoDuration::days(days)
                            - ChronoDuration::minutes(5);
                    }
                    Ok(())
                })
                .await?;
        }

        Ok(TestHarness {
            config,
            engine,
            store,
            lifecycle,
            key_name: self.key_name,
            key_value,
            _temp_dir: temp_dir,
        })
    }
}

/// A Keyward workspace in a temp directory, removed on drop.
pub struct TestHarness {
    pub config: KeywardConfig,
    pub engine: EncryptionEngine,
    pub store: Arc<KeyMetadataStore>,
    pub lifecycle: KeyLifecycleManager,
    pub key_name: String,
    pub key_value: SecretString,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn root(&self) -> &Path {
        self._temp_dir.path()
    }

    /// The key-holding env file.
    pub fn key_file(&self) -> PathBuf {
        self.config.environment.base_env_path()
    }

    /// Full path of a credential file name.
    pub fn env_path(&self, file: &str) -> PathBuf {
        self.config.environment.resolve(file)
    }

    /// Raw value of `variable` in `file`.
    pub async fn read_value(&self, file: &str, variable: &str) -> Option<String> {
        let env = EnvFile::load(&self.env_path(file), self.config.environment.io_timeout())
            .await
            .ok()?;
        env.get(variable).map(str::to_string)
    }

    /// Current value of the harness key in the key file.
    pub async fn current_key(&self) -> Option<SecretString> {
        let env = EnvFile::load(&self.key_file(), self.config.environment.io_timeout())
            .await
            .ok()?;
        env.get(&self.key_name)
            .map(|v| SecretString::from(v.to_string()))
    }

    /// Decrypt `variable` in `file` with `key`.
    pub async fn decrypt_with(
        &self,
        file: &str,
        variable: &str,
        key: &SecretString,
    ) -> Result<String, KeywardError> {
        let envelope = self
            .read_value(file, variable)
            .await
            .ok_or_else(|| KeywardError::NotFound(format!("{variable} in {file}")))?;
        let plain = self.engine.decrypt(&envelope, key).await?;
        Ok(plain.expose_secret().to_string())
    }
}
