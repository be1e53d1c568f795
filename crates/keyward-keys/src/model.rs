// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persisted key metadata.
//!
//! The JSON layout uses camelCase field names and snake_case enum values so
//! the record stays readable by the tooling that already consumes it.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use keyward_config::RotationDefaults;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Most recent audit events kept per key.
pub const MAX_AUDIT_EVENTS: usize = 100;

/// Most recent health checks kept per key.
pub const MAX_HEALTH_CHECKS: usize = 50;

/// The full metadata record: key name to metadata.
pub type MetadataMap = BTreeMap<String, KeyMetadata>;

/// Lifecycle status of a key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KeyStatus {
    Healthy,
    Warning,
    /// A rotation attempt failed.
    Critical,
    /// Older than its maximum age.
    Expired,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    Created,
    Rotated,
    Accessed,
    WarningIssued,
    Expired,
    HealthCheck,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

/// Why a key was rotated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RotationReason {
    Scheduled,
    Manual,
    Expired,
    SecurityBreach,
    Compromised,
}

/// What triggered a health check.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CheckSource {
    Startup,
    Scheduled,
    Manual,
    Api,
}

impl From<RotationReason> for CheckSource {
    fn from(reason: RotationReason) -> Self {
        match reason {
            RotationReason::Manual => CheckSource::Manual,
            RotationReason::Scheduled => CheckSource::Scheduled,
            _ => CheckSource::Api,
        }
    }
}

/// Rotation policy for one key.
///
/// Day counts are signed so an out-of-range value on disk still parses and
/// can be repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRotationConfig {
    pub max_age_in_days: i64,
    pub warning_threshold_in_days: i64,
    #[serde(default)]
    pub enable_auto_rotation: bool,
}

impl Default for KeyRotationConfig {
    fn default() -> Self {
        Self::from(&RotationDefaults::default())
    }
}

impl From<&RotationDefaults> for KeyRotationConfig {
    fn from(defaults: &RotationDefaults) -> Self {
        Self {
            max_age_in_days: defaults.max_age_in_days,
            warning_threshold_in_days: defaults.warning_threshold_in_days,
            enable_auto_rotation: defaults.enable_auto_rotation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    pub severity: Severity,
    pub source: String,
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// One rotation attempt, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationEvent {
    pub timestamp: DateTime<Utc>,
    pub reason: RotationReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_key_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_key_hash: Option<String>,
    #[serde(default)]
    pub affected_environments: Vec<String>,
    #[serde(default)]
    pub affected_variables: Vec<String>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_mode: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckEvent {
    pub timestamp: DateTime<Utc>,
    pub age_in_days: i64,
    pub days_until_expiry: i64,
    pub status: KeyStatus,
    pub check_source: CheckSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditTrail {
    #[serde(default)]
    pub audit_events: Vec<AuditEvent>,
    #[serde(default)]
    pub rotation_history: Vec<RotationEvent>,
    #[serde(default)]
    pub health_check_history: Vec<HealthCheckEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_scheduled_check: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_health_check: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_warning_issued: Option<DateTime<Utc>>,
}

impl AuditTrail {
    /// Append an audit event, evicting the oldest beyond [`MAX_AUDIT_EVENTS`].
    pub fn push_event(&mut self, event: AuditEvent) {
        self.audit_events.push(event);
        truncate_front(&mut self.audit_events, MAX_AUDIT_EVENTS);
    }

    /// Append a health check, evicting the oldest beyond [`MAX_HEALTH_CHECKS`],
    /// and stamp `last_health_check`.
    pub fn push_health_check(&mut self, check: HealthCheckEvent) {
        self.last_health_check = Some(check.timestamp);
        self.health_check_history.push(check);
        truncate_front(&mut self.health_check_history, MAX_HEALTH_CHECKS);
    }

    pub fn push_rotation(&mut self, event: RotationEvent) {
        self.rotation_history.push(event);
    }
}

fn truncate_front<T>(items: &mut Vec<T>, cap: usize) {
    if items.len() > cap {
        let excess = items.len() - cap;
        items.drain(..excess);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageTracking {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub environments_used_in: BTreeSet<String>,
    #[serde(default)]
    pub dependent_variables: BTreeSet<String>,
}

impl UsageTracking {
    /// Add environments and variables; existing entries are never removed.
    pub fn merge<E, V>(&mut self, environments: E, variables: V)
    where
        E: IntoIterator<Item = String>,
        V: IntoIterator<Item = String>,
    {
        self.environments_used_in.extend(environments);
        self.dependent_variables.extend(variables);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusTracking {
    pub current_status: KeyStatus,
    pub last_status_change: DateTime<Utc>,
    #[serde(default)]
    pub auto_rotation_enabled: bool,
}

impl StatusTracking {
    /// Move to `status`, stamping `last_status_change` only on a real change.
    ///
    /// Returns whether the status changed.
    pub fn transition(&mut self, status: KeyStatus, now: DateTime<Utc>) -> bool {
        if self.current_status == status {
            return false;
        }
        self.current_status = status;
        self.last_status_change = now;
        true
    }
}

/// Everything recorded about one logical key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMetadata {
    pub key_name: String,
    pub created_at: DateTime<Utc>,
    pub rotation_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_rotated_at: Option<DateTime<Utc>>,
    pub rotation_config: KeyRotationConfig,
    #[serde(default)]
    pub audit_trail: AuditTrail,
    #[serde(default)]
    pub usage_tracking: UsageTracking,
    pub status_tracking: StatusTracking,
}

impl KeyMetadata {
    /// A fresh, healthy record with an empty audit trail.
    pub fn new(key_name: impl Into<String>, config: KeyRotationConfig, now: DateTime<Utc>) -> Self {
        Self {
            key_name: key_name.into(),
            created_at: now,
            rotation_count: 0,
            last_rotated_at: None,
            rotation_config: config,
            audit_trail: AuditTrail::default(),
            usage_tracking: UsageTracking::default(),
            status_tracking: StatusTracking {
                current_status: KeyStatus::Healthy,
                last_status_change: now,
                auto_rotation_enabled: config.enable_auto_rotation,
            },
        }
    }

    /// Whole days since the last rotation (or creation), never negative.
    pub fn age_in_days(&self, now: DateTime<Utc>) -> i64 {
        let reference = self.last_rotated_at.unwrap_or(self.created_at);
        (now - reference).num_days().max(0)
    }

    /// Append an audit event built from its parts.
    pub fn record_event(
        &mut self,
        event_type: EventType,
        severity: Severity,
        source: &str,
        details: impl Into<String>,
        metadata: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) {
        self.audit_trail.push_event(AuditEvent {
            timestamp: now,
            event_type,
            severity,
            source: source.to_string(),
            details: details.into(),
            metadata,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    fn event(i: usize) -> AuditEvent {
        AuditEvent {
            timestamp: Utc::now(),
            event_type: EventType::Accessed,
            severity: Severity::Info,
            source: "test".to_string(),
            details: format!("event {i}"),
            metadata: None,
        }
    }

    fn check(i: i64) -> HealthCheckEvent {
        HealthCheckEvent {
            timestamp: Utc::now(),
            age_in_days: i,
            days_until_expiry: 90 - i,
            status: KeyStatus::Healthy,
            check_source: CheckSource::Manual,
            recommendations: None,
        }
    }

    #[test]
    fn audit_events_are_capped_keeping_newest() {
        let mut trail = AuditTrail::default();
        for i in 0..150 {
            trail.push_event(event(i));
        }
        assert_eq!(trail.audit_events.len(), MAX_AUDIT_EVENTS);
        assert_eq!(trail.audit_events[0].details, "event 50");
        assert_eq!(trail.audit_events[99].details, "event 149");
    }

    #[test]
    fn health_checks_are_capped_keeping_newest() {
        let mut trail = AuditTrail::default();
        for i in 0..60 {
            trail.push_health_check(check(i));
        }
        assert_eq!(trail.health_check_history.len(), MAX_HEALTH_CHECKS);
        assert_eq!(trail.health_check_history[0].age_in_days, 10);
        assert!(trail.last_health_check.is_some());
    }

    #[test]
    fn age_uses_last_rotation_and_floors() {
        let now = Utc::now();
        let mut md = KeyMetadata::new("DEV_SECRET_KEY", KeyRotationConfig::default(), now);
        md.created_at = now - Duration::days(40) - Duration::hours(23);
        assert_eq!(md.age_in_days(now), 40);

        md.last_rotated_at = Some(now - Duration::days(3));
        assert_eq!(md.age_in_days(now), 3);

        md.last_rotated_at = Some(now + Duration::days(1));
        assert_eq!(md.age_in_days(now), 0);
    }

    #[test]
    fn status_transition_stamps_only_on_change() {
        let start = Utc::now() - Duration::days(1);
        let mut tracking = StatusTracking {
            current_status: KeyStatus::Healthy,
            last_status_change: start,
            auto_rotation_enabled: false,
        };
        let now = Utc::now();
        assert!(!tracking.transition(KeyStatus::Healthy, now));
        assert_eq!(tracking.last_status_change, start);
        assert!(tracking.transition(KeyStatus::Warning, now));
        assert_eq!(tracking.last_status_change, now);
    }

    #[test]
    fn usage_merge_is_monotonic() {
        let mut usage = UsageTracking::default();
        usage.merge(vec!["uat.env".to_string()], vec!["PORTAL_PASSWORD".to_string()]);
        usage.merge(vec!["uat.env".to_string(), "dev.env".to_string()], Vec::new());
        assert_eq!(usage.environments_used_in.len(), 2);
        assert!(usage.dependent_variables.contains("PORTAL_PASSWORD"));
    }

    #[test]
    fn enums_use_snake_case_names() {
        assert_eq!(EventType::WarningIssued.to_string(), "warning_issued");
        assert_eq!(
            RotationReason::from_str("security_breach").unwrap(),
            RotationReason::SecurityBreach
        );
        let json = serde_json::to_string(&EventType::HealthCheck).unwrap();
        assert_eq!(json, "\"health_check\"");
        assert!(serde_json::from_str::<KeyStatus>("\"unknown\"").is_err());
    }

    #[test]
    fn metadata_json_uses_camel_case() {
        let md = KeyMetadata::new("DEV_SECRET_KEY", KeyRotationConfig::default(), Utc::now());
        let json = serde_json::to_value(&md).unwrap();
        assert!(json.get("keyName").is_some());
        assert!(json.get("rotationCount").is_some());
        assert_eq!(json["rotationConfig"]["maxAgeInDays"], 90);
        assert_eq!(json["statusTracking"]["currentStatus"], "healthy");
        assert!(json.get("lastRotatedAt").is_none());
    }

    #[test]
    fn rotation_reason_maps_to_check_source() {
        assert_eq!(CheckSource::from(RotationReason::Manual), CheckSource::Manual);
        assert_eq!(CheckSource::from(RotationReason::Scheduled), CheckSource::Scheduled);
        assert_eq!(CheckSource::from(RotationReason::Compromised), CheckSource::Api);
    }
}
