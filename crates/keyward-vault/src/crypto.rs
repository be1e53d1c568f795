// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level primitives: AES-256-GCM seal/open, HMAC-SHA256, random bytes and
//! constant-time comparison.
//!
//! Every call to [`seal`] draws a fresh random 96-bit nonce from the system
//! CSPRNG. Nonce reuse under one key would break GCM.

use hmac::{Hmac, Mac};
use keyward_core::KeywardError;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, AES_256_GCM};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// AES-GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// HMAC-SHA256 output length in bytes.
pub const MAC_LEN: usize = 32;

fn aead_key(key: &[u8; 32]) -> Result<LessSafeKey, KeywardError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| KeywardError::Internal("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt `plaintext` with AES-256-GCM under a random nonce.
///
/// Returns `(ciphertext_with_tag, nonce)`.
pub fn seal(key: &[u8; 32], plaintext: &[u8]) -> Result<(Vec<u8>, [u8; NONCE_LEN]), KeywardError> {
    let sealing_key = aead_key(key)?;
    let nonce_bytes = random_bytes::<NONCE_LEN>()?;

    let mut in_out = plaintext.to_vec();
    sealing_key
        .seal_in_place_append_tag(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::empty(),
            &mut in_out,
        )
        .map_err(|_| KeywardError::Internal("AES-256-GCM encryption failed".to_string()))?;

    Ok((in_out, nonce_bytes))
}

/// Decrypt AES-256-GCM ciphertext that carries its 16-byte tag.
///
/// Any tag mismatch is reported as [`KeywardError::Authentication`].
pub fn open(
    key: &[u8; 32],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Vec<u8>, KeywardError> {
    let opening_key = aead_key(key)?;

    let mut in_out = ciphertext.to_vec();
    let plaintext = opening_key
        .open_in_place(Nonce::assume_unique_for_key(*nonce), Aad::empty(), &mut in_out)
        .map_err(|_| KeywardError::Authentication)?;

    Ok(plaintext.to_vec())
}

/// HMAC-SHA256 over the concatenation of `parts`.
pub fn hmac_sha256(key: &[u8], parts: &[&[u8]]) -> Result<[u8; MAC_LEN], KeywardError> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(key)
        .map_err(|e| KeywardError::Internal(format!("invalid HMAC key: {e}")))?;
    for part in parts {
        mac.update(part);
    }
    let mut tag = [0u8; MAC_LEN];
    tag.copy_from_slice(&mac.finalize().into_bytes());
    Ok(tag)
}

/// Compare two byte strings without short-circuiting on the first difference.
///
/// A length mismatch returns `false` immediately; lengths are not secret.
pub fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let diff = a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y));
    diff == 0
}

/// Fill an array with bytes from the system CSPRNG.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], KeywardError> {
    let mut buf = [0u8; N];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| KeywardError::Internal("system random source unavailable".to_string()))?;
    Ok(buf)
}
