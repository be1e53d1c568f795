// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key rotation for Keyward.
//!
//! [`RotationOrchestrator`] replaces a protecting key and re-encrypts every
//! credential value that depends on it, recording the outcome in the key's
//! metadata through the lifecycle manager.

pub mod batch;
pub mod locks;
pub mod orchestrator;

pub use batch::DecryptedBatch;
pub use locks::KeyLocks;
pub use orchestrator::{RotationOrchestrator, RotationOutcome, RotationRequest, SkippedVariable};
