// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key lifecycle: rotation policy, health checks, audit trail and repair.
//!
//! Status is derived from the key's age against its rotation policy:
//!
//! | condition                         | status    |
//! |-----------------------------------|-----------|
//! | `age >= maxAge`                   | expired   |
//! | `maxAge - age <= warningThreshold`| warning   |
//! | otherwise                         | healthy   |
//!
//! `critical` is only set when a rotation attempt fails; the next health check
//! or a successful rotation recomputes it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use keyward_config::KeywardConfig;
use keyward_core::KeywardError;
use keyward_vault::secret::DEFAULT_MIN_SECRET_LENGTH;
use keyward_vault::{validate_secret, EnvFile};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::{error, info, warn};

use crate::model::{
    CheckSource, EventType, HealthCheckEvent, KeyMetadata, KeyRotationConfig, KeyStatus,
    MetadataMap, RotationEvent, RotationReason, Severity,
};
use crate::report::{
    AuditSummary, KeyAuditSummary, KeyInfo, RepairError, RepairReport, RotationStatus,
    RotationSweep, StartupSecurityCheck, StoreOutcome, SystemAuditReport, SystemHealth,
};
use crate::store::KeyMetadataStore;

/// Reject a rotation policy that violates `0 <= warning < maxAge`.
pub fn validate_rotation_config(
    config: &KeyRotationConfig,
) -> Result<KeyRotationConfig, KeywardError> {
    if config.max_age_in_days <= 0 {
        return Err(KeywardError::Config(format!(
            "maxAgeInDays must be positive, got {}",
            config.max_age_in_days
        )));
    }
    if config.warning_threshold_in_days < 0 {
        return Err(KeywardError::Config(format!(
            "warningThresholdInDays must not be negative, got {}",
            config.warning_threshold_in_days
        )));
    }
    if config.warning_threshold_in_days >= config.max_age_in_days {
        return Err(KeywardError::Config(format!(
            "warningThresholdInDays ({}) must be less than maxAgeInDays ({})",
            config.warning_threshold_in_days, config.max_age_in_days
        )));
    }
    Ok(*config)
}

/// Status of `metadata` under `config` at `now`.
pub fn evaluate(
    metadata: &KeyMetadata,
    config: &KeyRotationConfig,
    now: DateTime<Utc>,
) -> (RotationStatus, KeyStatus) {
    let age = metadata.age_in_days(now);
    let remaining = config.max_age_in_days - age;
    let needs_rotation = age >= config.max_age_in_days;
    let needs_warning = !needs_rotation && remaining <= config.warning_threshold_in_days;

    let status = if needs_rotation {
        KeyStatus::Expired
    } else if needs_warning {
        KeyStatus::Warning
    } else {
        KeyStatus::Healthy
    };

    (
        RotationStatus {
            needs_rotation,
            needs_warning,
            age_in_days: age,
            days_until_rotation: remaining.max(0),
        },
        status,
    )
}

/// Input to [`KeyLifecycleManager::store_base_environment_key`].
#[derive(Debug)]
pub struct StoreKeyRequest {
    /// The key-holding env file.
    pub key_file: PathBuf,
    pub key_name: String,
    pub key_value: SecretString,
    pub custom_max_age: Option<i64>,
    /// Overwrite an existing key and count it as a rotation.
    pub rotate: bool,
    pub environments_used_in: Vec<String>,
    pub dependent_variables: Vec<String>,
}

/// What a finished rotation changed, for the metadata record.
#[derive(Debug, Clone)]
pub struct RotationRecord {
    pub started_at: DateTime<Utc>,
    pub reason: RotationReason,
    pub old_key_hash: Option<String>,
    pub new_key_hash: String,
    pub affected_environments: Vec<String>,
    pub affected_variables: Vec<String>,
    pub reencrypted_count: usize,
    /// Already validated policy to install, when a custom max age was requested.
    pub rotation_config: Option<KeyRotationConfig>,
    pub override_mode: bool,
}

/// Owns rotation policy decisions and every mutation of key metadata.
#[derive(Debug, Clone)]
pub struct KeyLifecycleManager {
    store: Arc<KeyMetadataStore>,
    defaults: KeyRotationConfig,
    min_secret_length: usize,
    io_timeout: Duration,
}

impl KeyLifecycleManager {
    /// Create a manager; the default policy must itself be valid.
    pub fn new(
        store: Arc<KeyMetadataStore>,
        defaults: KeyRotationConfig,
        io_timeout: Duration,
    ) -> Result<Self, KeywardError> {
        let defaults = validate_rotation_config(&defaults)?;
        Ok(Self {
            store,
            defaults,
            min_secret_length: DEFAULT_MIN_SECRET_LENGTH,
            io_timeout,
        })
    }

    pub fn from_config(
        store: Arc<KeyMetadataStore>,
        config: &KeywardConfig,
    ) -> Result<Self, KeywardError> {
        let mut manager = Self::new(
            store,
            KeyRotationConfig::from(&config.rotation),
            config.environment.io_timeout(),
        )?;
        manager.min_secret_length = config.vault.min_secret_length.max(DEFAULT_MIN_SECRET_LENGTH);
        Ok(manager)
    }

    pub fn store(&self) -> &Arc<KeyMetadataStore> {
        &self.store
    }

    pub fn defaults(&self) -> KeyRotationConfig {
        self.defaults
    }

    pub fn io_timeout(&self) -> Duration {
        self.io_timeout
    }

    /// Single gatekeeper for rotation policies.
    pub fn validate_rotation_config(
        &self,
        config: &KeyRotationConfig,
    ) -> Result<KeyRotationConfig, KeywardError> {
        validate_rotation_config(config)
    }

    /// `base` with `maxAgeInDays` replaced by `custom_max_age`, validated.
    pub fn config_with_max_age(
        &self,
        base: &KeyRotationConfig,
        custom_max_age: i64,
    ) -> Result<KeyRotationConfig, KeywardError> {
        validate_rotation_config(&KeyRotationConfig {
            max_age_in_days: custom_max_age,
            ..*base
        })
    }

    /// The key's policy, or the defaults (with a warning) when it is invalid.
    fn effective_config(&self, key_name: &str, config: &KeyRotationConfig) -> KeyRotationConfig {
        match validate_rotation_config(config) {
            Ok(valid) => valid,
            Err(e) => {
                warn!(key = %key_name, error = %e, "invalid rotation config, using defaults");
                KeyRotationConfig {
                    enable_auto_rotation: config.enable_auto_rotation,
                    ..self.defaults
                }
            }
        }
    }

    /// Check one key, record a health check and update its status.
    ///
    /// An unknown key has no side effects and reports a fresh key.
    pub async fn check_key_rotation_status(
        &self,
        key_name: &str,
        source: CheckSource,
    ) -> Result<RotationStatus, KeywardError> {
        let now = Utc::now();
        let checked = self
            .store
            .update(|map| {
                let Some(metadata) = map.get_mut(key_name) else {
                    return Ok(None);
                };
                let config = self.effective_config(key_name, &metadata.rotation_config);
                let (status, key_status) = evaluate(metadata, &config, now);
                apply_health_check(metadata, status, key_status, source, now);
                Ok(Some(status))
            })
            .await?;

        Ok(checked.unwrap_or(RotationStatus {
            needs_rotation: false,
            needs_warning: false,
            age_in_days: 0,
            days_until_rotation: self.defaults.max_age_in_days,
        }))
    }

    /// Scheduled check of every key.
    pub async fn check_all_keys_for_rotation(&self) -> Result<RotationSweep, KeywardError> {
        self.sweep(CheckSource::Scheduled).await
    }

    async fn sweep(&self, source: CheckSource) -> Result<RotationSweep, KeywardError> {
        let mut sweep = RotationSweep::default();
        for key_name in self.store.key_names().await? {
            let status = self.check_key_rotation_status(&key_name, source).await?;
            if status.needs_rotation {
                error!(
                    key = %key_name,
                    age_days = status.age_in_days,
                    "key has expired and must be rotated immediately"
                );
                sweep.keys_needing_rotation.push(key_name);
            } else if status.needs_warning {
                warn!(
                    key = %key_name,
                    days_left = status.days_until_rotation,
                    age_days = status.age_in_days,
                    "key expires soon"
                );
                sweep.keys_needing_warning.push(key_name);
            }
        }
        Ok(sweep)
    }

    /// Sweep every key, then summarise the whole record.
    pub async fn perform_comprehensive_audit(&self) -> Result<SystemAuditReport, KeywardError> {
        self.audit(CheckSource::Scheduled).await
    }

    /// Audit with `startup` health checks; fails when system health is critical.
    pub async fn perform_startup_security_check(
        &self,
    ) -> Result<StartupSecurityCheck, KeywardError> {
        let report = self.audit(CheckSource::Startup).await?;
        let passed = report.system_health != SystemHealth::Critical;

        if !passed {
            error!(
                keys = ?report.keys_needing_rotation,
                "startup security check failed: system health is critical"
            );
        }
        if !report.keys_needing_warning.is_empty() {
            warn!(keys = ?report.keys_needing_warning, "some keys should be rotated soon");
        }
        if report.system_health == SystemHealth::Healthy {
            info!("startup security check passed, all keys are healthy");
        }

        Ok(StartupSecurityCheck {
            passed,
            system_health: report.system_health,
            critical_keys: report.keys_needing_rotation,
            warning_keys: report.keys_needing_warning,
            audit_summary: report.audit_summary,
            recommendations: report.recommendations,
        })
    }

    async fn audit(&self, source: CheckSource) -> Result<SystemAuditReport, KeywardError> {
        let sweep = self.sweep(source).await?;
        let map = self.store.read().await?;
        let now = Utc::now();

        let count = |status: KeyStatus| {
            map.values()
                .filter(|m| m.status_tracking.current_status == status)
                .count()
        };
        let healthy_keys = count(KeyStatus::Healthy);
        let warning_keys = count(KeyStatus::Warning);
        let critical_keys = count(KeyStatus::Critical);
        let expired: Vec<String> = map
            .values()
            .filter(|m| m.status_tracking.current_status == KeyStatus::Expired)
            .map(|m| m.key_name.clone())
            .collect();

        let ages: Vec<i64> = map.values().map(|m| m.age_in_days(now)).collect();
        let average = if ages.is_empty() {
            0.0
        } else {
            ages.iter().sum::<i64>() as f64 / ages.len() as f64
        };

        let system_health = if critical_keys + expired.len() > 0 {
            SystemHealth::Critical
        } else if warning_keys > 0 {
            SystemHealth::Warning
        } else {
            SystemHealth::Healthy
        };

        let mut recommendations = Vec::new();
        if critical_keys + expired.len() > 0 {
            recommendations.push(format!(
                "{} key(s) require immediate rotation",
                critical_keys + expired.len()
            ));
        }
        if warning_keys > 0 {
            recommendations.push(format!("{warning_keys} key(s) should be rotated soon"));
        }
        if average > self.defaults.max_age_in_days as f64 * 0.8 {
            recommendations.push("Consider reducing key rotation intervals".to_string());
        }

        let audit_summary = AuditSummary {
            total_keys: map.len(),
            healthy_keys,
            warning_keys,
            critical_keys,
            expired_keys: expired.len(),
            average_key_age: (average * 100.0).round() / 100.0,
            oldest_key_age: ages.iter().copied().max().unwrap_or(0),
            newest_key_age: ages.iter().copied().min().unwrap_or(0),
            total_audit_events: map.values().map(|m| m.audit_trail.audit_events.len()).sum(),
            total_rotations: map.values().map(|m| m.rotation_count).sum(),
            last_rotation: map.values().filter_map(|m| m.last_rotated_at).max(),
            last_health_check: map
                .values()
                .filter_map(|m| m.audit_trail.last_health_check)
                .max(),
            last_access: map
                .values()
                .filter_map(|m| m.usage_tracking.last_accessed_at)
                .max(),
            current_status: system_health,
        };

        info!(
            keys = audit_summary.total_keys,
            health = %system_health,
            "comprehensive key audit complete"
        );

        Ok(SystemAuditReport {
            system_health,
            keys_needing_rotation: sweep.keys_needing_rotation,
            keys_needing_warning: sweep.keys_needing_warning,
            expired_keys: expired,
            audit_summary,
            recommendations,
        })
    }

    /// Write a key into its env file and (re)initialise its metadata.
    pub async fn store_base_environment_key(
        &self,
        request: StoreKeyRequest,
    ) -> Result<StoreOutcome, KeywardError> {
        let key_name = request.key_name.as_str();
        validate_key_name(key_name)?;
        validate_secret(request.key_value.expose_secret(), self.min_secret_length)?;
        let config = match request.custom_max_age {
            Some(days) => self.config_with_max_age(&self.defaults, days)?,
            None => self.defaults,
        };

        let mut file = EnvFile::load(&request.key_file, self.io_timeout).await?;
        let existed = file.contains(key_name);
        if existed && !request.rotate {
            info!(
                key = %key_name,
                file = %request.key_file.display(),
                "key already exists; pass rotate to regenerate"
            );
            return Ok(StoreOutcome::Skipped);
        }
        file.set(key_name, request.key_value.expose_secret());
        file.save(&request.key_file, self.io_timeout).await?;

        let outcome = if existed {
            StoreOutcome::Rotated
        } else {
            StoreOutcome::Created
        };
        let now = Utc::now();
        let environments = request.environments_used_in;
        let variables = request.dependent_variables;

        self.store
            .update(|map| {
                let previous = map.get(key_name).map(|m| m.rotation_count).unwrap_or(0);
                let mut metadata = KeyMetadata::new(key_name, config, now);
                if outcome == StoreOutcome::Rotated {
                    metadata.rotation_count = previous + 1;
                }
                if request.rotate {
                    metadata.last_rotated_at = Some(now);
                }
                metadata
                    .usage_tracking
                    .merge(environments.iter().cloned(), variables.iter().cloned());

                let event_type = match outcome {
                    StoreOutcome::Rotated => EventType::Rotated,
                    _ => EventType::Created,
                };
                metadata.record_event(
                    event_type,
                    Severity::Info,
                    "store_base_environment_key",
                    format!(
                        "Secret key {outcome} with {}-day rotation period",
                        config.max_age_in_days
                    ),
                    Some(json!({
                        "initialMaxAge": config.max_age_in_days,
                        "environmentsUsedIn": environments,
                        "dependentVariables": variables,
                    })),
                    now,
                );
                map.insert(key_name.to_string(), metadata);
                Ok(())
            })
            .await?;

        info!(
            key = %key_name,
            outcome = %outcome,
            max_age_days = config.max_age_in_days,
            "key stored with rotation tracking"
        );
        Ok(outcome)
    }

    /// Reset every invalid rotation policy to the defaults.
    pub async fn validate_and_repair_all_metadata(&self) -> Result<RepairReport, KeywardError> {
        let now = Utc::now();
        let report = self
            .store
            .update(|map| {
                let mut report = RepairReport {
                    total_keys: map.len(),
                    ..RepairReport::default()
                };
                for (key_name, metadata) in map.iter_mut() {
                    match self.repair_in_place(metadata, now) {
                        Ok(true) => report.repaired_keys.push(key_name.clone()),
                        Ok(false) => {}
                        Err(e) => report.errors.push(RepairError {
                            key_name: key_name.clone(),
                            error: format!("Failed to repair: {e}"),
                        }),
                    }
                }
                Ok(report)
            })
            .await?;

        if !report.repaired_keys.is_empty() {
            info!(keys = ?report.repaired_keys, "rotation configs repaired");
        }
        for failed in &report.errors {
            error!(key = %failed.key_name, error = %failed.error, "rotation config not repaired");
        }
        Ok(report)
    }

    /// Repair one key's policy. Returns whether anything changed.
    pub async fn repair_key_config(&self, key_name: &str) -> Result<bool, KeywardError> {
        let now = Utc::now();
        self.store
            .update(|map| {
                let metadata = map
                    .get_mut(key_name)
                    .ok_or_else(|| KeywardError::NotFound(format!("key `{key_name}`")))?;
                self.repair_in_place(metadata, now)
            })
            .await
    }

    fn repair_in_place(
        &self,
        metadata: &mut KeyMetadata,
        now: DateTime<Utc>,
    ) -> Result<bool, KeywardError> {
        let Err(e) = validate_rotation_config(&metadata.rotation_config) else {
            return Ok(false);
        };
        warn!(key = %metadata.key_name, error = %e, "repairing invalid rotation config");
        metadata.rotation_config = validate_rotation_config(&KeyRotationConfig {
            enable_auto_rotation: metadata.rotation_config.enable_auto_rotation,
            ..self.defaults
        })?;
        metadata.record_event(
            EventType::Rotated,
            Severity::Warning,
            "validate_and_repair_all_metadata",
            format!("Repaired invalid rotation config: {e}"),
            None,
            now,
        );
        Ok(true)
    }

    /// Append an audit event. Returns `false` for an unknown key.
    pub async fn record_audit_event(
        &self,
        key_name: &str,
        event_type: EventType,
        severity: Severity,
        source: &str,
        details: &str,
        metadata: Option<serde_json::Value>,
    ) -> Result<bool, KeywardError> {
        let now = Utc::now();
        self.store
            .update(|map| {
                let Some(record) = map.get_mut(key_name) else {
                    return Ok(false);
                };
                record.record_event(event_type, severity, source, details, metadata, now);
                Ok(true)
            })
            .await
    }

    /// Stamp `lastAccessedAt` and record an `accessed` event.
    pub async fn record_key_access(
        &self,
        key_name: &str,
        source: &str,
    ) -> Result<bool, KeywardError> {
        let now = Utc::now();
        let found = self
            .store
            .update(|map| {
                let Some(record) = map.get_mut(key_name) else {
                    return Ok(false);
                };
                record.usage_tracking.last_accessed_at = Some(now);
                record.record_event(
                    EventType::Accessed,
                    Severity::Info,
                    source,
                    format!("Key accessed from {source}"),
                    None,
                    now,
                );
                Ok(true)
            })
            .await?;
        if !found {
            warn!(key = %key_name, "access recorded for unknown key");
        }
        Ok(found)
    }

    /// Metadata, an `api` status check and a summary for one key.
    pub async fn get_key_info(&self, key_name: &str) -> Result<Option<KeyInfo>, KeywardError> {
        if !self.store.has(key_name).await? {
            return Ok(None);
        }
        let rotation_status = self
            .check_key_rotation_status(key_name, CheckSource::Api)
            .await?;
        let Some(metadata) = self.store.get(key_name).await? else {
            return Ok(None);
        };

        let audit_summary = KeyAuditSummary {
            total_rotations: metadata.rotation_count,
            last_rotation: metadata.last_rotated_at,
            last_health_check: metadata.audit_trail.last_health_check,
            last_access: metadata.usage_tracking.last_accessed_at,
            current_status: SystemHealth::from(metadata.status_tracking.current_status),
            total_audit_events: metadata.audit_trail.audit_events.len(),
        };
        Ok(Some(KeyInfo {
            metadata,
            rotation_status,
            audit_summary,
        }))
    }

    /// Record a successful rotation and return the updated metadata.
    pub async fn record_rotation_success(
        &self,
        key_name: &str,
        record: RotationRecord,
    ) -> Result<KeyMetadata, KeywardError> {
        let now = Utc::now();
        self.store
            .update(|map| {
                let metadata = map
                    .get_mut(key_name)
                    .ok_or_else(|| KeywardError::NotFound(format!("key `{key_name}`")))?;

                if let Some(config) = record.rotation_config {
                    metadata.rotation_config = config;
                }
                let config = self.effective_config(key_name, &metadata.rotation_config);
                metadata.rotation_config = config;
                metadata.rotation_count += 1;
                metadata.last_rotated_at = Some(now);
                metadata.usage_tracking.merge(
                    record.affected_environments.iter().cloned(),
                    record.affected_variables.iter().cloned(),
                );
                metadata.usage_tracking.last_accessed_at = Some(now);
                metadata.status_tracking.transition(KeyStatus::Healthy, now);

                metadata.audit_trail.push_rotation(RotationEvent {
                    timestamp: record.started_at,
                    reason: record.reason,
                    old_key_hash: record.old_key_hash.clone(),
                    new_key_hash: Some(record.new_key_hash.clone()),
                    affected_environments: record.affected_environments.clone(),
                    affected_variables: record.affected_variables.clone(),
                    success: true,
                    error_details: None,
                    override_mode: Some(record.override_mode),
                });
                metadata.audit_trail.push_health_check(HealthCheckEvent {
                    timestamp: now,
                    age_in_days: 0,
                    days_until_expiry: config.max_age_in_days,
                    status: KeyStatus::Healthy,
                    check_source: CheckSource::from(record.reason),
                    recommendations: None,
                });
                let rotation_count = metadata.rotation_count;
                metadata.record_event(
                    EventType::Rotated,
                    Severity::Info,
                    "rotate_key_with_audit",
                    format!(
                        "Key rotated successfully. Reason: {}. Re-encrypted {} variables across {} files",
                        record.reason,
                        record.reencrypted_count,
                        record.affected_environments.len()
                    ),
                    Some(json!({
                        "reason": record.reason,
                        "affectedEnvironments": record.affected_environments,
                        "affectedVariables": record.affected_variables,
                        "reEncryptedCount": record.reencrypted_count,
                        "rotationCount": rotation_count,
                        "overrideMode": record.override_mode,
                    })),
                    now,
                );
                Ok(metadata.clone())
            })
            .await
    }

    /// Record a failed rotation and mark the key critical.
    ///
    /// Missing metadata is logged and ignored so the original failure is the
    /// one reported to the caller.
    pub async fn record_rotation_failure(
        &self,
        key_name: &str,
        record: RotationRecord,
        failure: &str,
    ) -> Result<(), KeywardError> {
        let now = Utc::now();
        let recorded = self
            .store
            .update(|map| {
                let Some(metadata) = map.get_mut(key_name) else {
                    return Ok(false);
                };
                let config = self.effective_config(key_name, &metadata.rotation_config);
                let (status, _) = evaluate(metadata, &config, now);

                metadata.audit_trail.push_rotation(RotationEvent {
                    timestamp: record.started_at,
                    reason: record.reason,
                    old_key_hash: record.old_key_hash.clone(),
                    new_key_hash: Some(record.new_key_hash.clone()),
                    affected_environments: Vec::new(),
                    affected_variables: Vec::new(),
                    success: false,
                    error_details: Some(failure.to_string()),
                    override_mode: Some(record.override_mode),
                });
                metadata.status_tracking.transition(KeyStatus::Critical, now);
                metadata.audit_trail.push_health_check(HealthCheckEvent {
                    timestamp: now,
                    age_in_days: status.age_in_days,
                    days_until_expiry: status.days_until_rotation,
                    status: KeyStatus::Critical,
                    check_source: CheckSource::from(record.reason),
                    recommendations: Some(vec![
                        "Previous rotation failed - investigate and retry".to_string(),
                    ]),
                });
                metadata.record_event(
                    EventType::Rotated,
                    Severity::Error,
                    "rotate_key_with_audit",
                    format!("Key rotation failed: {failure}"),
                    Some(json!({ "reason": record.reason })),
                    now,
                );
                Ok(true)
            })
            .await?;

        if !recorded {
            warn!(key = %key_name, "no metadata to record rotation failure against");
        }
        Ok(())
    }

    /// Snapshot of every record.
    pub async fn all_metadata(&self) -> Result<MetadataMap, KeywardError> {
        self.store.read().await
    }
}

fn apply_health_check(
    metadata: &mut KeyMetadata,
    status: RotationStatus,
    key_status: KeyStatus,
    source: CheckSource,
    now: DateTime<Utc>,
) {
    let recommendations = match key_status {
        KeyStatus::Expired => Some(vec![
            "Key has expired and should be rotated immediately".to_string(),
        ]),
        KeyStatus::Warning => Some(vec![format!(
            "Consider rotating within {} days",
            status.days_until_rotation
        )]),
        _ => None,
    };

    metadata.audit_trail.push_health_check(HealthCheckEvent {
        timestamp: now,
        age_in_days: status.age_in_days,
        days_until_expiry: status.days_until_rotation,
        status: key_status,
        check_source: source,
        recommendations,
    });
    if source == CheckSource::Scheduled {
        metadata.audit_trail.last_scheduled_check = Some(now);
    }
    metadata.status_tracking.transition(key_status, now);

    if status.needs_rotation {
        metadata.record_event(
            EventType::Expired,
            Severity::Critical,
            "check_key_rotation_status",
            format!(
                "Key has expired and requires immediate rotation ({} days old)",
                status.age_in_days
            ),
            None,
            now,
        );
    } else if status.needs_warning {
        metadata.record_event(
            EventType::WarningIssued,
            Severity::Warning,
            "check_key_rotation_status",
            format!("Key will expire in {} days", status.days_until_rotation),
            None,
            now,
        );
        metadata.audit_trail.last_warning_issued = Some(now);
    }
}

/// Names must be usable as `NAME=` in an env file.
fn validate_key_name(name: &str) -> Result<(), KeywardError> {
    if name.is_empty() || name.contains('=') || name.contains(char::is_whitespace) {
        return Err(KeywardError::Validation(format!(
            "`{name}` is not a valid environment variable name"
        )));
    }
    Ok(())
}
