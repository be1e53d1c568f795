// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Keyward.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key fails
//! at startup instead of silently falling back to a default.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Keyward configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeywardConfig {
    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Key derivation and envelope settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Default key rotation policy applied to new keys and used for repairs.
    #[serde(default)]
    pub rotation: RotationDefaults,

    /// Metadata record location and backup retention.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Environment file locations and I/O limits.
    #[serde(default)]
    pub environment: EnvironmentConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Argon2id and envelope configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// Argon2id memory cost in KiB (default: 65536 = 64 MiB).
    #[serde(default = "default_kdf_memory_cost")]
    pub kdf_memory_cost: u32,

    /// Argon2id iteration count (default: 3).
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,

    /// Argon2id parallelism lanes (default: 4).
    #[serde(default = "default_kdf_parallelism")]
    pub kdf_parallelism: u32,

    /// Emit a detached HMAC-SHA256 tag as the fourth envelope part.
    #[serde(default = "default_detached_hmac")]
    pub detached_hmac: bool,

    /// Minimum accepted length of a protecting secret.
    #[serde(default = "default_min_secret_length")]
    pub min_secret_length: usize,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            kdf_memory_cost: default_kdf_memory_cost(),
            kdf_iterations: default_kdf_iterations(),
            kdf_parallelism: default_kdf_parallelism(),
            detached_hmac: default_detached_hmac(),
            min_secret_length: default_min_secret_length(),
        }
    }
}

fn default_kdf_memory_cost() -> u32 {
    65536 // 64 MiB per OWASP recommendation
}

fn default_kdf_iterations() -> u32 {
    3
}

fn default_kdf_parallelism() -> u32 {
    4
}

fn default_detached_hmac() -> bool {
    true
}

fn default_min_secret_length() -> usize {
    16
}

/// Default rotation policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RotationDefaults {
    /// Maximum key age before rotation is required.
    #[serde(default = "default_max_age_in_days")]
    pub max_age_in_days: i64,

    /// Days before expiry at which warnings start.
    #[serde(default = "default_warning_threshold_in_days")]
    pub warning_threshold_in_days: i64,

    /// Whether keys are flagged for automatic rotation.
    #[serde(default)]
    pub enable_auto_rotation: bool,
}

impl Default for RotationDefaults {
    fn default() -> Self {
        Self {
            max_age_in_days: default_max_age_in_days(),
            warning_threshold_in_days: default_warning_threshold_in_days(),
            enable_auto_rotation: false,
        }
    }
}

fn default_max_age_in_days() -> i64 {
    90
}

fn default_warning_threshold_in_days() -> i64 {
    7
}

/// Metadata record storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Directory holding the metadata record and its `archive/` backups.
    #[serde(default = "default_metadata_dir")]
    pub metadata_dir: String,

    /// File name of the metadata record.
    #[serde(default = "default_metadata_file")]
    pub metadata_file: String,

    /// Number of timestamped backups kept in `archive/`.
    #[serde(default = "default_backup_retention")]
    pub backup_retention: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            metadata_dir: default_metadata_dir(),
            metadata_file: default_metadata_file(),
            backup_retention: default_backup_retention(),
        }
    }
}

impl StorageConfig {
    /// Full path of the metadata record.
    pub fn metadata_path(&self) -> PathBuf {
        PathBuf::from(&self.metadata_dir).join(&self.metadata_file)
    }
}

fn default_metadata_dir() -> String {
    ".keyward".to_string()
}

fn default_metadata_file() -> String {
    "keyMetadata.json".to_string()
}

fn default_backup_retention() -> usize {
    20
}

/// Environment file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Directory containing the credential files.
    #[serde(default = "default_env_dir")]
    pub env_dir: String,

    /// Name of the key-holding file inside `env_dir`.
    #[serde(default = "default_base_env_file")]
    pub base_env_file: String,

    /// Deadline for a single file read or write.
    #[serde(default = "default_io_timeout_secs")]
    pub io_timeout_secs: u64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            env_dir: default_env_dir(),
            base_env_file: default_base_env_file(),
            io_timeout_secs: default_io_timeout_secs(),
        }
    }
}

impl EnvironmentConfig {
    /// Resolve a credential file name relative to `env_dir`.
    ///
    /// Absolute paths are returned unchanged.
    pub fn resolve(&self, file: &str) -> PathBuf {
        let path = PathBuf::from(file);
        if path.is_absolute() {
            path
        } else {
            PathBuf::from(&self.env_dir).join(path)
        }
    }

    /// Full path of the key-holding file.
    pub fn base_env_path(&self) -> PathBuf {
        self.resolve(&self.base_env_file)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }
}

fn default_env_dir() -> String {
    "envs".to_string()
}

fn default_base_env_file() -> String {
    ".env".to_string()
}

fn default_io_timeout_secs() -> u64 {
    30
}
