// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id key derivation.
//!
//! One Argon2id run (Algorithm::Argon2id, Version::V0x13) produces 64 bytes:
//! the first 32 become the AES-256-GCM key, the last 32 the HMAC-SHA256 key.

use base64::Engine;
use keyward_config::VaultConfig;
use keyward_core::KeywardError;
use zeroize::Zeroizing;

use crate::crypto::random_bytes;

/// Salt length in bytes.
pub const SALT_LEN: usize = 16;

const OUTPUT_LEN: usize = 64;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::from(&VaultConfig::default())
    }
}

impl From<&VaultConfig> for KdfParams {
    fn from(config: &VaultConfig) -> Self {
        Self {
            memory_cost: config.kdf_memory_cost,
            iterations: config.kdf_iterations,
            parallelism: config.kdf_parallelism,
        }
    }
}

/// The encryption/authentication key pair derived from one secret and salt.
pub struct DerivedKeys {
    pub encryption_key: Zeroizing<[u8; 32]>,
    pub hmac_key: Zeroizing<[u8; 32]>,
}

impl std::fmt::Debug for DerivedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKeys")
            .field("encryption_key", &"[REDACTED]")
            .field("hmac_key", &"[REDACTED]")
            .finish()
    }
}

/// Derive keys from a secret and a base64-encoded salt.
///
/// Fails with [`KeywardError::KeyDerivation`] if the salt is not valid base64.
pub fn derive_keys(
    secret: &[u8],
    salt_b64: &str,
    params: KdfParams,
) -> Result<DerivedKeys, KeywardError> {
    let salt = base64::engine::general_purpose::STANDARD
        .decode(salt_b64)
        .map_err(|e| KeywardError::KeyDerivation(format!("salt is not valid base64: {e}")))?;
    derive_keys_from_salt(secret, &salt, params)
}

/// Derive keys from a secret and raw salt bytes.
pub fn derive_keys_from_salt(
    secret: &[u8],
    salt: &[u8],
    params: KdfParams,
) -> Result<DerivedKeys, KeywardError> {
    let argon_params = argon2::Params::new(
        params.memory_cost,
        params.iterations,
        params.parallelism,
        Some(OUTPUT_LEN),
    )
    .map_err(|e| KeywardError::KeyDerivation(format!("invalid Argon2id parameters: {e}")))?;

    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon_params,
    );

    let mut output = Zeroizing::new([0u8; OUTPUT_LEN]);
    argon2
        .hash_password_into(secret, salt, output.as_mut())
        .map_err(|e| KeywardError::KeyDerivation(format!("Argon2id derivation failed: {e}")))?;

    let mut encryption_key = Zeroizing::new([0u8; 32]);
    let mut hmac_key = Zeroizing::new([0u8; 32]);
    encryption_key.copy_from_slice(&output[..32]);
    hmac_key.copy_from_slice(&output[32..]);

    Ok(DerivedKeys {
        encryption_key,
        hmac_key,
    })
}

/// Generate a random salt.
pub fn generate_salt() -> Result<[u8; SALT_LEN], KeywardError> {
    random_bytes::<SALT_LEN>()
}
