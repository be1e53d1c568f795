// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Protecting-secret rules: strength validation, generation and fingerprints.

use base64::Engine;
use keyward_core::KeywardError;
use secrecy::SecretString;
use sha2::{Digest, Sha256};

use crate::crypto::random_bytes;

/// Default minimum secret length in characters.
pub const DEFAULT_MIN_SECRET_LENGTH: usize = 16;

/// Predictable values rejected as secrets regardless of case.
pub const COMMON_WEAK_KEYS: &[&str] = &[
    "test",
    "default",
    "secret",
    "password",
    "password123",
    "pass",
    "key",
    "api",
    "access",
    "123",
    "1234",
    "12345",
    "123456",
    "1234567",
    "12345678",
    "123456789",
    "1234567890",
    "111111",
    "000000",
    "654321",
    "letmein",
    "welcome",
    "qwerty",
    "qwertyuiop",
    "abc123",
    "password1",
    "passw0rd",
    "p@ssword",
    "p@ssw0rd",
    "changeme",
    "temp123",
    "mysecret",
    "defaultpassword",
    "opensesame",
];

/// Check that `secret` is usable as a protecting secret.
///
/// Fails with [`KeywardError::Validation`] when it is empty, a known weak
/// value, or shorter than `min_length` characters.
pub fn validate_secret(secret: &str, min_length: usize) -> Result<(), KeywardError> {
    if secret.is_empty() {
        return Err(KeywardError::Validation(
            "secret key must not be empty".to_string(),
        ));
    }
    if COMMON_WEAK_KEYS
        .iter()
        .any(|weak| weak.eq_ignore_ascii_case(secret))
    {
        return Err(KeywardError::Validation(
            "secret key is a common weak value".to_string(),
        ));
    }
    let length = secret.chars().count();
    if length < min_length {
        return Err(KeywardError::Validation(format!(
            "secret key must be at least {min_length} characters, got {length}"
        )));
    }
    Ok(())
}

/// Generate a fresh secret: 32 random bytes, standard base64 (44 characters).
pub fn generate_secret_key() -> Result<SecretString, KeywardError> {
    let bytes = zeroize::Zeroizing::new(random_bytes::<32>()?);
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes.as_ref());
    Ok(SecretString::from(encoded))
}

/// Truncated SHA-256 of `value`: the first 16 hex characters.
///
/// Used to correlate keys in audit records without storing them.
pub fn fingerprint(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(16);
    hex
}
