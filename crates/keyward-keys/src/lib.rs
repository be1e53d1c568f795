// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key metadata and lifecycle management for Keyward.
//!
//! [`KeyMetadataStore`] persists one JSON record of every protecting key, with
//! archive backups and corruption quarantine. [`KeyLifecycleManager`] applies
//! rotation policy on top of it: health checks, expiry warnings, audit events
//! and repair of invalid policies.

pub mod lifecycle;
pub mod model;
pub mod report;
pub mod store;

pub use lifecycle::{
    evaluate, validate_rotation_config, KeyLifecycleManager, RotationRecord, StoreKeyRequest,
};
pub use model::{
    AuditEvent, AuditTrail, CheckSource, EventType, HealthCheckEvent, KeyMetadata,
    KeyRotationConfig, KeyStatus, MetadataMap, RotationEvent, RotationReason, Severity,
};
pub use report::{
    AuditSummary, KeyAuditSummary, KeyInfo, RepairError, RepairReport, RotationStatus,
    RotationSweep, StartupSecurityCheck, StoreOutcome, SystemAuditReport, SystemHealth,
};
pub use store::KeyMetadataStore;
