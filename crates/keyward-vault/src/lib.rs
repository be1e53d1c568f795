// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encryption engine for Keyward.
//!
//! Individual secret values are sealed with AES-256-GCM under a key derived by
//! Argon2id from a protecting secret, optionally carry a detached HMAC-SHA256,
//! and are stored inline in `KEY=value` files as `ENC:` envelopes.

pub mod crypto;
pub mod engine;
pub mod envelope;
pub mod envfile;
pub mod kdf;
pub mod protect;
pub mod secret;

pub use crypto::constant_time_compare;
pub use engine::EncryptionEngine;
pub use envelope::{is_encrypted, Envelope};
pub use envfile::EnvFile;
pub use kdf::{derive_keys, DerivedKeys, KdfParams};
pub use protect::{protect_file, ProtectOptions, ProtectReport};
pub use secret::{fingerprint, generate_secret_key, validate_secret, COMMON_WEAK_KEYS};
