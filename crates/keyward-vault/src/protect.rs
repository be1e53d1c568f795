// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Encrypt plaintext variables of a credential file in place.

use std::path::Path;
use std::time::Duration;

use keyward_core::KeywardError;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::engine::EncryptionEngine;
use crate::envelope::is_encrypted;
use crate::envfile::EnvFile;

/// Which variables to protect and how.
#[derive(Debug, Clone, Default)]
pub struct ProtectOptions {
    /// Variable names to encrypt. Empty means every variable in the file.
    pub variables: Vec<String>,
    /// Decrypt and re-encrypt values that are already envelopes.
    pub force_reencrypt: bool,
    /// Variables that must stay as they are, such as a key stored beside the
    /// values it protects. Requesting one by name is an error.
    pub exclude: Vec<String>,
}

/// What [`protect_file`] did, by variable name.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ProtectReport {
    pub encrypted: Vec<String>,
    pub reencrypted: Vec<String>,
    /// Already encrypted (without force), empty, or excluded.
    pub skipped: Vec<String>,
    /// Requested but not present in the file.
    pub missing: Vec<String>,
}

impl ProtectReport {
    pub fn changed(&self) -> bool {
        !self.encrypted.is_empty() || !self.reencrypted.is_empty()
    }
}

/// Encrypt variables of the credential file at `path` under `secret`.
///
/// The file is rewritten atomically, and only when at least one value changed.
/// A value that fails to decrypt during a forced re-encryption aborts the
/// whole operation before anything is written.
pub async fn protect_file(
    engine: &EncryptionEngine,
    path: &Path,
    secret: &SecretString,
    options: &ProtectOptions,
    timeout: Duration,
) -> Result<ProtectReport, KeywardError> {
    engine.validate_secret(secret)?;
    if let Some(name) = options
        .variables
        .iter()
        .find(|name| options.exclude.contains(name))
    {
        return Err(KeywardError::Validation(format!(
            "`{name}` is excluded from encryption in {}",
            path.display()
        )));
    }
    let mut file = EnvFile::load_existing(path, timeout).await?;
    let mut report = ProtectReport::default();

    let targets: Vec<(String, Option<String>)> = if options.variables.is_empty() {
        file.variables()
            .into_iter()
            .map(|(name, value)| (name.to_string(), Some(value.to_string())))
            .collect()
    } else {
        options
            .variables
            .iter()
            .map(|name| (name.clone(), file.get(name).map(str::to_string)))
            .collect()
    };

    for (name, value) in targets {
        let Some(value) = value else {
            warn!(variable = %name, file = %path.display(), "requested variable not found");
            report.missing.push(name);
            continue;
        };

        if options.exclude.contains(&name) {
            debug!(variable = %name, "excluded variable skipped");
            report.skipped.push(name);
            continue;
        }

        if value.is_empty() {
            debug!(variable = %name, "empty value skipped");
            report.skipped.push(name);
            continue;
        }

        if is_encrypted(&value) {
            if !options.force_reencrypt {
                report.skipped.push(name);
                continue;
            }
            let plaintext = engine.decrypt(&value, secret).await?;
            let envelope = engine.encrypt(plaintext.expose_secret(), secret).await?;
            file.set(&name, &envelope);
            report.reencrypted.push(name);
            continue;
        }

        let envelope = engine.encrypt(&value, secret).await?;
        file.set(&name, &envelope);
        report.encrypted.push(name);
    }

    if report.changed() {
        file.save(path, timeout).await?;
        info!(
            file = %path.display(),
            encrypted = report.encrypted.len(),
            reencrypted = report.reencrypted.len(),
            "credential file protected"
        );
    } else {
        info!(file = %path.display(), "nothing to encrypt");
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kdf::KdfParams;

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn engine() -> EncryptionEngine {
        EncryptionEngine::with_params(KdfParams {
            memory_cost: 1024,
            iterations: 1,
            parallelism: 1,
        })
    }

    fn key() -> SecretString {
        SecretString::from("uat-protecting-secret-1".to_string())
    }

    async fn write(path: &Path, content: &str) {
        tokio::fs::write(path, content).await.unwrap();
    }

    #[tokio::test]
    async fn encrypts_all_variables_and_skips_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.uat");
        write(&path, "# uat\nPORTAL_USERNAME=alice\nPORTAL_PASSWORD=hunter2\nEMPTY=\n").await;

        let report = protect_file(&engine(), &path, &key(), &ProtectOptions::default(), TIMEOUT)
            .await
            .unwrap();
        assert_eq!(report.encrypted, vec!["PORTAL_USERNAME", "PORTAL_PASSWORD"]);
        assert_eq!(report.skipped, vec!["EMPTY"]);

        let file = EnvFile::load_existing(&path, TIMEOUT).await.unwrap();
        let stored = file.get("PORTAL_PASSWORD").unwrap();
        assert!(is_encrypted(stored));
        let plain = engine().decrypt(stored, &key()).await.unwrap();
        assert_eq!(plain.expose_secret(), "hunter2");
        assert!(file.render().starts_with("# uat\n"));
    }

    #[tokio::test]
    async fn named_variables_report_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.uat");
        write(&path, "PORTAL_PASSWORD=hunter2\nDB_HOST=localhost\n").await;

        let options = ProtectOptions {
            variables: vec!["PORTAL_PASSWORD".into(), "API_TOKEN".into()],
            ..ProtectOptions::default()
        };
        let report = protect_file(&engine(), &path, &key(), &options, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(report.encrypted, vec!["PORTAL_PASSWORD"]);
        assert_eq!(report.missing, vec!["API_TOKEN"]);

        let file = EnvFile::load_existing(&path, TIMEOUT).await.unwrap();
        assert_eq!(file.get("DB_HOST"), Some("localhost"));
    }

    #[tokio::test]
    async fn already_encrypted_is_skipped_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.uat");
        let envelope = engine().encrypt("hunter2", &key()).await.unwrap();
        write(&path, &format!("PORTAL_PASSWORD={envelope}\n")).await;

        let report = protect_file(&engine(), &path, &key(), &ProtectOptions::default(), TIMEOUT)
            .await
            .unwrap();
        assert_eq!(report.skipped, vec!["PORTAL_PASSWORD"]);
        assert!(!report.changed());

        let forced = ProtectOptions {
            force_reencrypt: true,
            ..ProtectOptions::default()
        };
        let report = protect_file(&engine(), &path, &key(), &forced, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(report.reencrypted, vec!["PORTAL_PASSWORD"]);

        let file = EnvFile::load_existing(&path, TIMEOUT).await.unwrap();
        let stored = file.get("PORTAL_PASSWORD").unwrap();
        assert_ne!(stored, envelope);
        let plain = engine().decrypt(stored, &key()).await.unwrap();
        assert_eq!(plain.expose_secret(), "hunter2");
    }

    #[tokio::test]
    async fn excluded_variables_are_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        write(&path, "DEV_SECRET_KEY=uat-protecting-secret-1\nDB_PASSWORD=hunter2\n").await;

        let options = ProtectOptions {
            exclude: vec!["DEV_SECRET_KEY".into()],
            ..ProtectOptions::default()
        };
        let report = protect_file(&engine(), &path, &key(), &options, TIMEOUT)
            .await
            .unwrap();
        assert_eq!(report.encrypted, vec!["DB_PASSWORD"]);
        assert_eq!(report.skipped, vec!["DEV_SECRET_KEY"]);

        let file = EnvFile::load_existing(&path, TIMEOUT).await.unwrap();
        assert_eq!(file.get("DEV_SECRET_KEY"), Some("uat-protecting-secret-1"));
    }

    #[tokio::test]
    async fn requesting_an_excluded_variable_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        let content = "DEV_SECRET_KEY=uat-protecting-secret-1\nDB_PASSWORD=hunter2\n";
        write(&path, content).await;

        let options = ProtectOptions {
            variables: vec!["DB_PASSWORD".into(), "DEV_SECRET_KEY".into()],
            exclude: vec!["DEV_SECRET_KEY".into()],
            ..ProtectOptions::default()
        };
        let err = protect_file(&engine(), &path, &key(), &options, TIMEOUT)
            .await
            .unwrap_err();
        assert!(matches!(err, KeywardError::Validation(_)));
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), content);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = protect_file(
            &engine(),
            &dir.path().join("absent.env"),
            &key(),
            &ProtectOptions::default(),
            TIMEOUT,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, KeywardError::NotFound(_)));
    }

    #[tokio::test]
    async fn weak_secret_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.uat");
        write(&path, "A=1\n").await;
        let err = protect_file(
            &engine(),
            &path,
            &SecretString::from("secret".to_string()),
            &ProtectOptions::default(),
            TIMEOUT,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, KeywardError::Validation(_)));
    }
}
