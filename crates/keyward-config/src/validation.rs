// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde cannot express: Argon2 cost floors, the rotation
//! policy ordering, and non-empty paths. All violations are collected.

use crate::diagnostic::ConfigError;
use crate::model::KeywardConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Absolute floor for secret length; configuration may raise it, never lower it.
pub const MIN_SECRET_LENGTH_FLOOR: usize = 16;

/// Validate a deserialized configuration.
///
/// Returns every violation found rather than stopping at the first.
pub fn validate_config(config: &KeywardConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        fail(format!(
            "logging.level `{}` must be one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }

    let vault = &config.vault;
    if vault.kdf_parallelism == 0 {
        fail("vault.kdf_parallelism must be at least 1".to_string());
    }
    // Argon2 requires at least 8 KiB of memory per lane.
    if vault.kdf_memory_cost < 8 * vault.kdf_parallelism.max(1) {
        fail(format!(
            "vault.kdf_memory_cost must be at least 8 KiB per lane, got {} for {} lanes",
            vault.kdf_memory_cost, vault.kdf_parallelism
        ));
    }
    if vault.kdf_iterations == 0 {
        fail("vault.kdf_iterations must be at least 1".to_string());
    }
    if vault.min_secret_length < MIN_SECRET_LENGTH_FLOOR {
        fail(format!(
            "vault.min_secret_length must be at least {MIN_SECRET_LENGTH_FLOOR}, got {}",
            vault.min_secret_length
        ));
    }

    let rotation = &config.rotation;
    if rotation.max_age_in_days <= 0 {
        fail(format!(
            "rotation.max_age_in_days must be positive, got {}",
            rotation.max_age_in_days
        ));
    }
    if rotation.warning_threshold_in_days < 0 {
        fail(format!(
            "rotation.warning_threshold_in_days must not be negative, got {}",
            rotation.warning_threshold_in_days
        ));
    }
    if rotation.warning_threshold_in_days >= rotation.max_age_in_days {
        fail(format!(
            "rotation.warning_threshold_in_days ({}) must be less than rotation.max_age_in_days ({})",
            rotation.warning_threshold_in_days, rotation.max_age_in_days
        ));
    }

    if config.storage.metadata_dir.trim().is_empty() {
        fail("storage.metadata_dir must not be empty".to_string());
    }
    if config.storage.metadata_file.trim().is_empty() {
        fail("storage.metadata_file must not be empty".to_string());
    }
    if config.storage.backup_retention == 0 {
        fail("storage.backup_retention must be at least 1".to_string());
    }

    if config.environment.env_dir.trim().is_empty() {
        fail("environment.env_dir must not be empty".to_string());
    }
    if config.environment.base_env_file.trim().is_empty() {
        fail("environment.base_env_file must not be empty".to_string());
    }
    if config.environment.io_timeout_secs == 0 {
        fail("environment.io_timeout_secs must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
