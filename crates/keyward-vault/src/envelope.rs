// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `ENC:` envelope format.
//!
//! ```text
//! ENC:<salt>:<iv>:<ciphertext+tag>[:<hmac>]
//! ```
//!
//! Every part is standard padded base64. Three parts carry AEAD only; the
//! optional fourth part is an HMAC-SHA256 over `salt || iv || ciphertext`.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use keyward_core::KeywardError;

use crate::crypto::{MAC_LEN, NONCE_LEN, TAG_LEN};
use crate::kdf::SALT_LEN;

/// Marker that starts every encrypted value.
pub const PREFIX: &str = "ENC:";

/// Separator between envelope parts.
pub const SEPARATOR: char = ':';

/// Cheap shape check: does `value` look like an envelope?
pub fn is_encrypted(value: &str) -> bool {
    value.starts_with(PREFIX)
}

/// A parsed envelope with decoded binary fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub salt: [u8; SALT_LEN],
    pub iv: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
    pub hmac: Option<[u8; MAC_LEN]>,
}

impl Envelope {
    /// Parse and shape-check an envelope string.
    ///
    /// Fails with [`KeywardError::MalformedEnvelope`] on a missing prefix, a
    /// wrong part count, an empty or non-base64 part, or a wrong field length.
    pub fn parse(value: &str) -> Result<Self, KeywardError> {
        let body = value.strip_prefix(PREFIX).ok_or_else(|| {
            KeywardError::MalformedEnvelope(format!("missing `{PREFIX}` prefix"))
        })?;

        let parts: Vec<&str> = body.split(SEPARATOR).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return Err(KeywardError::MalformedEnvelope(format!(
                "expected 3 or 4 parts, got {}",
                parts.len()
            )));
        }

        let salt = decode_fixed::<SALT_LEN>("salt", parts[0])?;
        let iv = decode_fixed::<NONCE_LEN>("iv", parts[1])?;
        let ciphertext = decode_part("ciphertext", parts[2])?;
        if ciphertext.len() < TAG_LEN {
            return Err(KeywardError::MalformedEnvelope(
                "ciphertext is shorter than the authentication tag".to_string(),
            ));
        }
        let hmac = match parts.get(3) {
            Some(part) => Some(decode_fixed::<MAC_LEN>("hmac", part)?),
            None => None,
        };

        Ok(Self {
            salt,
            iv,
            ciphertext,
            hmac,
        })
    }

    /// The bytes covered by the detached HMAC.
    pub fn authenticated_parts(&self) -> [&[u8]; 3] {
        [&self.salt, &self.iv, &self.ciphertext]
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{PREFIX}{}{SEPARATOR}{}{SEPARATOR}{}",
            STANDARD.encode(self.salt),
            STANDARD.encode(self.iv),
            STANDARD.encode(&self.ciphertext)
        )?;
        if let Some(hmac) = &self.hmac {
            write!(f, "{SEPARATOR}{}", STANDARD.encode(hmac))?;
        }
        Ok(())
    }
}

fn decode_part(name: &str, part: &str) -> Result<Vec<u8>, KeywardError> {
    if part.is_empty() {
        return Err(KeywardError::MalformedEnvelope(format!("{name} is empty")));
    }
    STANDARD
        .decode(part)
        .map_err(|e| KeywardError::MalformedEnvelope(format!("{name} is not valid base64: {e}")))
}

fn decode_fixed<const N: usize>(name: &str, part: &str) -> Result<[u8; N], KeywardError> {
    let bytes = decode_part(name, part)?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        KeywardError::MalformedEnvelope(format!(
            "{name} must be {N} bytes, got {}",
            bytes.len()
        ))
    })
}
