// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Result types returned by the lifecycle manager.

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;

use crate::model::{KeyMetadata, KeyStatus};

/// Outcome of a rotation status check for one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationStatus {
    pub needs_rotation: bool,
    pub needs_warning: bool,
    pub age_in_days: i64,
    /// Days left before the key expires, clamped at zero.
    pub days_until_rotation: i64,
}

/// Keys flagged by a scheduled sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationSweep {
    pub keys_needing_rotation: Vec<String>,
    pub keys_needing_warning: Vec<String>,
}

/// Aggregate health of a key or of all keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SystemHealth {
    Healthy,
    Warning,
    Critical,
}

impl From<KeyStatus> for SystemHealth {
    fn from(status: KeyStatus) -> Self {
        match status {
            KeyStatus::Healthy => SystemHealth::Healthy,
            KeyStatus::Warning => SystemHealth::Warning,
            KeyStatus::Critical | KeyStatus::Expired => SystemHealth::Critical,
        }
    }
}

/// Counters and timestamps across every key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub total_keys: usize,
    pub healthy_keys: usize,
    pub warning_keys: usize,
    pub critical_keys: usize,
    pub expired_keys: usize,
    /// Rounded to two decimals.
    pub average_key_age: f64,
    pub oldest_key_age: i64,
    pub newest_key_age: i64,
    pub total_audit_events: usize,
    pub total_rotations: u64,
    pub last_rotation: Option<DateTime<Utc>>,
    pub last_health_check: Option<DateTime<Utc>>,
    pub last_access: Option<DateTime<Utc>>,
    pub current_status: SystemHealth,
}

/// Result of [`perform_comprehensive_audit`](crate::KeyLifecycleManager::perform_comprehensive_audit).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemAuditReport {
    pub system_health: SystemHealth,
    pub keys_needing_rotation: Vec<String>,
    pub keys_needing_warning: Vec<String>,
    pub expired_keys: Vec<String>,
    pub audit_summary: AuditSummary,
    pub recommendations: Vec<String>,
}

/// Pass/fail gate built on the audit, for process startup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupSecurityCheck {
    /// False when system health is critical.
    pub passed: bool,
    pub system_health: SystemHealth,
    pub critical_keys: Vec<String>,
    pub warning_keys: Vec<String>,
    pub audit_summary: AuditSummary,
    pub recommendations: Vec<String>,
}

/// Per-key summary returned with [`KeyInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyAuditSummary {
    pub total_rotations: u64,
    pub last_rotation: Option<DateTime<Utc>>,
    pub last_health_check: Option<DateTime<Utc>>,
    pub last_access: Option<DateTime<Utc>>,
    pub current_status: SystemHealth,
    pub total_audit_events: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    pub metadata: KeyMetadata,
    pub rotation_status: RotationStatus,
    pub audit_summary: KeyAuditSummary,
}

/// What [`store_base_environment_key`](crate::KeyLifecycleManager::store_base_environment_key) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StoreOutcome {
    Created,
    Rotated,
    /// The key already existed and rotation was not requested.
    Skipped,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub total_keys: usize,
    pub repaired_keys: Vec<String>,
    pub errors: Vec<RepairError>,
}

/// A key whose policy could not be repaired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairError {
    pub key_name: String,
    pub error: String,
}
