// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Keyward credential-protection engine.

use thiserror::Error;

/// The primary error type used across all Keyward crates.
///
/// Authentication failures deliberately carry no detail: a wrong key and a
/// tampered envelope must be indistinguishable to the caller.
#[derive(Debug, Error)]
pub enum KeywardError {
    /// Invalid rotation policy or configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Input failed structural or semantic validation (weak secret, bad metadata, bad base64).
    #[error("validation error: {0}")]
    Validation(String),

    /// An encrypted envelope does not have the expected shape.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// HMAC or AEAD tag verification failed.
    #[error("authentication failed: wrong key or tampered data")]
    Authentication,

    /// Argon2id key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// A key, variable, or record was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The key file did not hold the new key value after it was written.
    #[error("rotation integrity check failed: {0}")]
    RotationIntegrity(String),

    /// The persisted metadata record could not be parsed or validated.
    #[error("metadata corruption: {0}")]
    MetadataCorruption(String),

    /// File system failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failure outside the metadata recovery path.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// One element of a batch operation failed; the batch is abandoned.
    #[error("batch element {index} failed: {source}")]
    Batch {
        index: usize,
        #[source]
        source: Box<KeywardError>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KeywardError {
    /// Returns true for failures raised by the cryptographic layer.
    ///
    /// These are never swallowed by recovery paths.
    pub fn is_cryptographic(&self) -> bool {
        match self {
            KeywardError::Authentication | KeywardError::KeyDerivation(_) => true,
            KeywardError::Batch { source, .. } => source.is_cryptographic(),
            _ => false,
        }
    }
}
