// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The encryption engine: turns secret values into `ENC:` envelopes and back.
//!
//! Decryption authenticates before it decrypts. When the envelope carries a
//! detached HMAC it is checked first with [`constant_time_compare`]; the AEAD
//! tag is checked second. Both failures surface as the same
//! [`KeywardError::Authentication`] value, so a wrong key and tampered data are
//! indistinguishable.

use keyward_config::VaultConfig;
use keyward_core::KeywardError;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{self, constant_time_compare};
use crate::envelope::Envelope;
use crate::kdf::{self, KdfParams};
use crate::secret::{validate_secret, DEFAULT_MIN_SECRET_LENGTH};

/// Authenticated encryption of individual secret values.
#[derive(Debug, Clone)]
pub struct EncryptionEngine {
    params: KdfParams,
    detached_hmac: bool,
    min_secret_length: usize,
}

impl Default for EncryptionEngine {
    fn default() -> Self {
        Self::new(&VaultConfig::default())
    }
}

impl EncryptionEngine {
    /// Build an engine from the `[vault]` configuration section.
    pub fn new(config: &VaultConfig) -> Self {
        Self {
            params: KdfParams::from(config),
            detached_hmac: config.detached_hmac,
            min_secret_length: config.min_secret_length.max(DEFAULT_MIN_SECRET_LENGTH),
        }
    }

    /// Build an engine with explicit KDF parameters and default envelope settings.
    pub fn with_params(params: KdfParams) -> Self {
        Self {
            params,
            detached_hmac: true,
            min_secret_length: DEFAULT_MIN_SECRET_LENGTH,
        }
    }

    /// Choose whether new envelopes carry a detached HMAC (four parts).
    pub fn detached_hmac(mut self, enabled: bool) -> Self {
        self.detached_hmac = enabled;
        self
    }

    pub fn params(&self) -> KdfParams {
        self.params
    }

    pub fn min_secret_length(&self) -> usize {
        self.min_secret_length
    }

    /// Validate `secret` against the strength rules this engine enforces.
    pub fn validate_secret(&self, secret: &SecretString) -> Result<(), KeywardError> {
        validate_secret(secret.expose_secret(), self.min_secret_length)
    }

    /// Encrypt `plaintext` under `secret`.
    pub async fn encrypt(
        &self,
        plaintext: &str,
        secret: &SecretString,
    ) -> Result<String, KeywardError> {
        if plaintext.is_empty() {
            return Err(KeywardError::Validation(
                "cannot encrypt an empty value".to_string(),
            ));
        }
        self.validate_secret(secret)?;

        let secret_bytes = owned_secret(secret);
        let plaintext = Zeroizing::new(plaintext.as_bytes().to_vec());
        let params = self.params;
        let detached_hmac = self.detached_hmac;

        let envelope = run_blocking(move || {
            let salt = kdf::generate_salt()?;
            let keys = kdf::derive_keys_from_salt(&secret_bytes, &salt, params)?;
            let (ciphertext, iv) = crypto::seal(&keys.encryption_key, &plaintext)?;

            let mut envelope = Envelope {
                salt,
                iv,
                ciphertext,
                hmac: None,
            };
            if detached_hmac {
                envelope.hmac = Some(crypto::hmac_sha256(
                    keys.hmac_key.as_ref(),
                    &envelope.authenticated_parts(),
                )?);
            }
            Ok(envelope)
        })
        .await?;

        debug!(hmac = detached_hmac, "value encrypted");
        Ok(envelope.to_string())
    }

    /// Decrypt an envelope produced by [`encrypt`](Self::encrypt).
    pub async fn decrypt(
        &self,
        envelope: &str,
        secret: &SecretString,
    ) -> Result<SecretString, KeywardError> {
        let envelope = Envelope::parse(envelope)?;
        let secret_bytes = owned_secret(secret);
        let params = self.params;

        let plaintext = run_blocking(move || {
            let keys = kdf::derive_keys_from_salt(&secret_bytes, &envelope.salt, params)?;

            if let Some(expected) = &envelope.hmac {
                let computed =
                    crypto::hmac_sha256(keys.hmac_key.as_ref(), &envelope.authenticated_parts())?;
                if !constant_time_compare(&computed, expected) {
                    return Err(KeywardError::Authentication);
                }
            }

            let bytes = Zeroizing::new(crypto::open(
                &keys.encryption_key,
                &envelope.iv,
                &envelope.ciphertext,
            )?);
            String::from_utf8(bytes.to_vec()).map_err(|_| KeywardError::Authentication)
        })
        .await?;

        Ok(SecretString::from(plaintext))
    }

    /// Decrypt a batch concurrently, preserving input order.
    ///
    /// Any failing element fails the whole batch with [`KeywardError::Batch`].
    pub async fn decrypt_many(
        &self,
        envelopes: &[String],
        secret: &SecretString,
    ) -> Result<Vec<SecretString>, KeywardError> {
        let tasks = envelopes.iter().enumerate().map(|(index, envelope)| async move {
            self.decrypt(envelope, secret)
                .await
                .map_err(|e| KeywardError::Batch {
                    index,
                    source: Box::new(e),
                })
        });
        futures::future::try_join_all(tasks).await
    }
}

fn owned_secret(secret: &SecretString) -> Zeroizing<Vec<u8>> {
    Zeroizing::new(secret.expose_secret().as_bytes().to_vec())
}

/// Run CPU-heavy Argon2 work on the blocking pool.
async fn run_blocking<T, F>(f: F) -> Result<T, KeywardError>
where
    F: FnOnce() -> Result<T, KeywardError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| KeywardError::Internal(format!("crypto task failed: {e}")))?
}
