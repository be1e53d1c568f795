// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key rotation with staged re-encryption and audit recording.
//!
//! A rotation runs in phases so that no credential file is left encrypted
//! under a key nobody holds:
//!
//! 1. decrypt every target value with the current key into a [`DecryptedBatch`]
//! 2. re-encrypt under the new key and render each file in memory
//! 3. install the new key and read it back
//! 4. commit the rendered files, restoring everything on a failed commit
//! 5. record the rotation in the key's metadata

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use keyward_core::io::{canonical_path, read_optional, write_atomic};
use keyward_core::KeywardError;
use keyward_keys::{EventType, KeyLifecycleManager, RotationReason, RotationRecord, Severity};
use keyward_vault::{constant_time_compare, fingerprint, is_encrypted, EncryptionEngine, EnvFile};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::batch::DecryptedBatch;
use crate::locks::KeyLocks;

const AUDIT_SOURCE: &str = "rotate_key_with_audit";

/// Everything needed to rotate one key.
#[derive(Debug)]
pub struct RotationRequest {
    /// The env file that holds the key itself.
    pub key_file: PathBuf,
    pub key_name: String,
    pub new_key_value: SecretString,
    /// Credential files whose values are re-encrypted.
    pub target_files: Vec<PathBuf>,
    pub reason: RotationReason,
    pub custom_max_age: Option<i64>,
    /// Also encrypt non-empty plaintext values found in the target files.
    pub include_plaintext: bool,
}

impl RotationRequest {
    /// A manual rotation of `key_name` across `target_files`.
    pub fn new(
        key_file: impl Into<PathBuf>,
        key_name: impl Into<String>,
        new_key_value: SecretString,
        target_files: Vec<PathBuf>,
    ) -> Self {
        Self {
            key_file: key_file.into(),
            key_name: key_name.into(),
            new_key_value,
            target_files,
            reason: RotationReason::Manual,
            custom_max_age: None,
            include_plaintext: false,
        }
    }

    pub fn reason(mut self, reason: RotationReason) -> Self {
        self.reason = reason;
        self
    }

    pub fn custom_max_age(mut self, days: i64) -> Self {
        self.custom_max_age = Some(days);
        self
    }

    pub fn include_plaintext(mut self, include: bool) -> Self {
        self.include_plaintext = include;
        self
    }
}

/// A variable left untouched because it could not be decrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedVariable {
    pub file: PathBuf,
    pub variable: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationOutcome {
    pub key_name: String,
    pub rotation_count: u64,
    pub reencrypted_count: usize,
    /// Target files that were rewritten.
    pub affected_files: Vec<PathBuf>,
    pub affected_variables: Vec<String>,
    pub skipped: Vec<SkippedVariable>,
    pub old_key_hash: String,
    pub new_key_hash: String,
}

struct StagedFile {
    path: PathBuf,
    original: String,
    rendered: String,
    variables: Vec<String>,
}

struct Executed {
    staged: Vec<StagedFile>,
    skipped: Vec<SkippedVariable>,
    old_key_hash: String,
}

/// Runs rotations, one at a time per key.
#[derive(Debug)]
pub struct RotationOrchestrator {
    engine: EncryptionEngine,
    lifecycle: KeyLifecycleManager,
    locks: KeyLocks,
    io_timeout: Duration,
    #[cfg(test)]
    fail_commit_of: Option<PathBuf>,
}

impl RotationOrchestrator {
    pub fn new(engine: EncryptionEngine, lifecycle: KeyLifecycleManager) -> Self {
        let io_timeout = lifecycle.io_timeout();
        Self {
            engine,
            lifecycle,
            locks: KeyLocks::new(),
            io_timeout,
            #[cfg(test)]
            fail_commit_of: None,
        }
    }

    pub fn engine(&self) -> &EncryptionEngine {
        &self.engine
    }

    pub fn lifecycle(&self) -> &KeyLifecycleManager {
        &self.lifecycle
    }

    pub fn locks(&self) -> &KeyLocks {
        &self.locks
    }

    /// Rotate a key and re-encrypt every value protected by it.
    ///
    /// Failures after the rotation has started are recorded against the key,
    /// which is marked critical, before being returned.
    pub async fn rotate_key_with_audit(
        &self,
        mut request: RotationRequest,
    ) -> Result<RotationOutcome, KeywardError> {
        let key_name = request.key_name.clone();
        let _guard = self.locks.acquire(&key_name).await;

        self.engine.validate_secret(&request.new_key_value)?;
        request.target_files = self.distinct_targets(&request).await?;
        if self.lifecycle.repair_key_config(&key_name).await? {
            info!(key = %key_name, "invalid rotation config repaired before rotation");
        }
        let metadata = self
            .lifecycle
            .store()
            .get(&key_name)
            .await?
            .ok_or_else(|| KeywardError::NotFound(format!("no metadata for key `{key_name}`")))?;
        let rotation_config = request
            .custom_max_age
            .map(|days| {
                self.lifecycle
                    .config_with_max_age(&metadata.rotation_config, days)
            })
            .transpose()?;

        info!(
            key = %key_name,
            reason = %request.reason,
            files = request.target_files.len(),
            include_plaintext = request.include_plaintext,
            "starting key rotation"
        );
        self.lifecycle
            .record_audit_event(
                &key_name,
                EventType::Rotated,
                Severity::Info,
                AUDIT_SOURCE,
                &format!("Key rotation started. Reason: {}", request.reason),
                Some(json!({
                    "reason": request.reason,
                    "targetFiles": request.target_files.len(),
                    "overrideMode": request.include_plaintext,
                })),
            )
            .await?;

        let mut record = RotationRecord {
            started_at: Utc::now(),
            reason: request.reason,
            old_key_hash: None,
            new_key_hash: fingerprint(request.new_key_value.expose_secret()),
            affected_environments: Vec::new(),
            affected_variables: Vec::new(),
            reencrypted_count: 0,
            rotation_config,
            override_mode: request.include_plaintext,
        };

        let executed = match self.execute(&request, &mut record).await {
            Ok(executed) => executed,
            Err(e) => return Err(self.fail(&key_name, record, e).await),
        };

        record.affected_environments = executed
            .staged
            .iter()
            .map(|f| f.path.display().to_string())
            .collect();
        record.affected_variables = executed
            .staged
            .iter()
            .flat_map(|f| f.variables.iter().cloned())
            .collect();
        record.reencrypted_count = record.affected_variables.len();

        let updated = match self
            .lifecycle
            .record_rotation_success(&key_name, record.clone())
            .await
        {
            Ok(updated) => updated,
            Err(e) => return Err(self.fail(&key_name, record, e).await),
        };

        info!(
            key = %key_name,
            reencrypted = record.reencrypted_count,
            files = executed.staged.len(),
            skipped = executed.skipped.len(),
            rotation_count = updated.rotation_count,
            "key rotated"
        );

        Ok(RotationOutcome {
            key_name,
            rotation_count: updated.rotation_count,
            reencrypted_count: record.reencrypted_count,
            affected_files: executed.staged.into_iter().map(|f| f.path).collect(),
            affected_variables: record.affected_variables,
            skipped: executed.skipped,
            old_key_hash: executed.old_key_hash,
            new_key_hash: record.new_key_hash,
        })
    }

    /// [`rotate_key_with_audit`](Self::rotate_key_with_audit) with a single target file.
    pub async fn rotate_key_for_single_environment(
        &self,
        mut request: RotationRequest,
        environment_file: impl Into<PathBuf>,
    ) -> Result<RotationOutcome, KeywardError> {
        let environment_file = environment_file.into();
        info!(file = %environment_file.display(), "rotating key for a single environment");
        request.target_files = vec![environment_file];
        self.rotate_key_with_audit(request).await
    }

    /// Target files in request order with repeats removed.
    ///
    /// Paths are compared after resolution. The key file is rejected since
    /// staging would overwrite the newly installed key.
    async fn distinct_targets(
        &self,
        request: &RotationRequest,
    ) -> Result<Vec<PathBuf>, KeywardError> {
        let key_file = canonical_path(&request.key_file, self.io_timeout).await?;
        let mut seen = HashSet::new();
        let mut targets = Vec::with_capacity(request.target_files.len());
        for path in &request.target_files {
            let resolved = canonical_path(path, self.io_timeout).await?;
            if resolved == key_file {
                return Err(KeywardError::Validation(format!(
                    "{} holds the key and cannot also be a rotation target",
                    request.key_file.display()
                )));
            }
            if seen.insert(resolved) {
                targets.push(path.clone());
            } else {
                warn!(file = %path.display(), "duplicate rotation target ignored");
            }
        }
        Ok(targets)
    }

    async fn fail(&self, key_name: &str, record: RotationRecord, e: KeywardError) -> KeywardError {
        error!(key = %key_name, error = %e, "key rotation failed");
        if let Err(audit) = self
            .lifecycle
            .record_rotation_failure(key_name, record, &e.to_string())
            .await
        {
            error!(key = %key_name, error = %audit, "could not record rotation failure");
        }
        e
    }

    async fn execute(
        &self,
        request: &RotationRequest,
        record: &mut RotationRecord,
    ) -> Result<Executed, KeywardError> {
        let key_name = request.key_name.as_str();

        let (key_original, mut key_file) = self.load(&request.key_file).await?;
        let current_key = key_file
            .get(key_name)
            .filter(|v| !v.is_empty())
            .map(|v| SecretString::from(v.to_string()))
            .ok_or_else(|| {
                KeywardError::NotFound(format!(
                    "key `{key_name}` not found in {}",
                    request.key_file.display()
                ))
            })?;
        let old_key_hash = fingerprint(current_key.expose_secret());
        record.old_key_hash = Some(old_key_hash.clone());
        if constant_time_compare(
            current_key.expose_secret().as_bytes(),
            request.new_key_value.expose_secret().as_bytes(),
        ) {
            return Err(KeywardError::RotationIntegrity(format!(
                "new value for key `{key_name}` is identical to the current one"
            )));
        }

        let (batch, loaded, skipped) = self.decrypt_targets(request, &current_key).await?;
        drop(current_key);

        let staged = self.stage(request, &batch, loaded).await?;
        drop(batch);

        key_file.set(key_name, request.new_key_value.expose_secret());
        key_file.save(&request.key_file, self.io_timeout).await?;
        let installed = EnvFile::load_existing(&request.key_file, self.io_timeout).await?;
        if installed.get(key_name) != Some(request.new_key_value.expose_secret()) {
            self.restore(&request.key_file, &key_original).await;
            return Err(KeywardError::RotationIntegrity(format!(
                "key `{key_name}` in {} does not match the new value after writing",
                request.key_file.display()
            )));
        }
        debug!(key = %key_name, "new key installed and verified");

        let mut committed: Vec<&StagedFile> = Vec::new();
        for file in &staged {
            if let Err(e) = self.commit_file(file).await {
                error!(
                    file = %file.path.display(),
                    error = %e,
                    "commit failed, restoring previous files and key"
                );
                for done in &committed {
                    self.restore(&done.path, &done.original).await;
                }
                self.restore(&request.key_file, &key_original).await;
                return Err(e);
            }
            committed.push(file);
        }

        Ok(Executed {
            staged,
            skipped,
            old_key_hash,
        })
    }

    async fn decrypt_targets(
        &self,
        request: &RotationRequest,
        current_key: &SecretString,
    ) -> Result<(DecryptedBatch, Vec<(String, EnvFile)>, Vec<SkippedVariable>), KeywardError> {
        let mut batch = DecryptedBatch::new();
        let mut loaded = Vec::with_capacity(request.target_files.len());
        let mut skipped = Vec::new();

        for (index, path) in request.target_files.iter().enumerate() {
            let (original, file) = self.load(path).await?;
            for (variable, value) in file.variables() {
                if is_encrypted(value) {
                    match self.engine.decrypt(value, current_key).await {
                        Ok(plain) => batch.push(index, variable, plain),
                        Err(e) => {
                            warn!(
                                file = %path.display(),
                                variable = %variable,
                                error = %e,
                                "skipping variable that could not be decrypted"
                            );
                            skipped.push(SkippedVariable {
                                file: path.clone(),
                                variable: variable.to_string(),
                                error: e.to_string(),
                            });
                        }
                    }
                } else if request.include_plaintext && !value.is_empty() {
                    batch.push(index, variable, SecretString::from(value.to_string()));
                }
            }
            loaded.push((original, file));
        }

        if batch.is_empty() {
            warn!(
                key = %request.key_name,
                "no values were decrypted; only the key itself will be rotated"
            );
        }
        Ok((batch, loaded, skipped))
    }

    async fn stage(
        &self,
        request: &RotationRequest,
        batch: &DecryptedBatch,
        loaded: Vec<(String, EnvFile)>,
    ) -> Result<Vec<StagedFile>, KeywardError> {
        let mut staged = Vec::new();
        for (index, (original, mut file)) in loaded.into_iter().enumerate() {
            let mut variables = Vec::new();
            for entry in batch.for_file(index) {
                let envelope = self
                    .engine
                    .encrypt(entry.value.expose_secret(), &request.new_key_value)
                    .await?;
                file.set(&entry.variable, &envelope);
                variables.push(entry.variable.clone());
            }
            if variables.is_empty() {
                continue;
            }
            staged.push(StagedFile {
                path: request.target_files[index].clone(),
                original,
                rendered: file.render(),
                variables,
            });
        }
        debug!(files = staged.len(), "re-encryption staged");
        Ok(staged)
    }

    async fn load(&self, path: &Path) -> Result<(String, EnvFile), KeywardError> {
        let content = read_optional(path, self.io_timeout)
            .await?
            .ok_or_else(|| KeywardError::NotFound(format!("{} does not exist", path.display())))?;
        let file = EnvFile::parse(&content);
        Ok((content, file))
    }

    async fn commit_file(&self, file: &StagedFile) -> Result<(), KeywardError> {
        #[cfg(test)]
        if self.fail_commit_of.as_deref() == Some(file.path.as_path()) {
            return Err(KeywardError::Io(std::io::Error::other(
                "disk refused the write",
            )));
        }
        write_atomic(&file.path, file.rendered.as_bytes(), self.io_timeout).await
    }

    async fn restore(&self, path: &Path, original: &str) {
        match write_atomic(path, original.as_bytes(), self.io_timeout).await {
            Ok(()) => warn!(file = %path.display(), "restored previous contents"),
            Err(e) => error!(
                file = %path.display(),
                error = %e,
                "could not restore previous contents; manual recovery required"
            ),
        }
    }
}
