// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-file persistence for key metadata.
//!
//! Reads never fail on a damaged record: an unparsable or structurally
//! invalid file is copied into `archive/` as `<file>.corrupt-<timestamp>` and
//! treated as empty. Writes back up the previous record, validate, and replace
//! the file atomically. Every read-modify-write runs under one async writer
//! lock so concurrent updates from this process cannot interleave.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use keyward_config::KeywardConfig;
use keyward_core::io::{read_optional, with_timeout, write_atomic};
use keyward_core::KeywardError;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::model::{KeyMetadata, MetadataMap, MAX_AUDIT_EVENTS, MAX_HEALTH_CHECKS};

const ARCHIVE_DIR: &str = "archive";

/// File-backed store of [`KeyMetadata`] records.
#[derive(Debug)]
pub struct KeyMetadataStore {
    path: PathBuf,
    backup_retention: usize,
    io_timeout: Duration,
    writer: Mutex<()>,
}

impl KeyMetadataStore {
    pub fn new(path: impl Into<PathBuf>, backup_retention: usize, io_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            backup_retention,
            io_timeout,
            writer: Mutex::new(()),
        }
    }

    /// Build a store from the `[storage]` and `[environment]` sections.
    pub fn from_config(config: &KeywardConfig) -> Self {
        Self::new(
            config.storage.metadata_path(),
            config.storage.backup_retention,
            config.environment.io_timeout(),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding backups and quarantined records.
    pub fn archive_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(|p| p.join(ARCHIVE_DIR))
            .unwrap_or_else(|| PathBuf::from(ARCHIVE_DIR))
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "keyMetadata.json".to_string())
    }

    /// Read the whole record.
    ///
    /// A missing or blank file is an empty map. A corrupt file is quarantined
    /// and also read as empty. I/O failures are returned.
    pub async fn read(&self) -> Result<MetadataMap, KeywardError> {
        let Some(content) = read_optional(&self.path, self.io_timeout).await? else {
            debug!(path = %self.path.display(), "metadata record does not exist yet");
            return Ok(MetadataMap::new());
        };
        if content.trim().is_empty() {
            warn!(path = %self.path.display(), "metadata record is empty");
            return Ok(MetadataMap::new());
        }

        match parse_record(&content) {
            Ok(map) => {
                debug!(keys = map.len(), "metadata record loaded");
                Ok(map)
            }
            Err(e @ KeywardError::MetadataCorruption(_)) => {
                error!(
                    path = %self.path.display(),
                    error = %e,
                    "metadata record is corrupt, continuing with an empty record"
                );
                self.quarantine(&content).await;
                Ok(MetadataMap::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the whole record.
    pub async fn write(&self, map: &MetadataMap) -> Result<(), KeywardError> {
        let _guard = self.writer.lock().await;
        self.write_locked(map).await
    }

    /// Run one read-modify-write cycle under the writer lock.
    ///
    /// The record is only rewritten when `f` succeeds and actually changed it.
    pub async fn update<T, F>(&self, f: F) -> Result<T, KeywardError>
    where
        F: FnOnce(&mut MetadataMap) -> Result<T, KeywardError>,
    {
        let _guard = self.writer.lock().await;
        let mut map = self.read().await?;
        let before = map.clone();
        let result = f(&mut map)?;
        if map != before {
            self.write_locked(&map).await?;
        }
        Ok(result)
    }

    /// Insert or replace one key's metadata.
    pub async fn update_single(
        &self,
        key_name: &str,
        metadata: KeyMetadata,
    ) -> Result<(), KeywardError> {
        let name = key_name.to_string();
        self.update(move |map| {
            map.insert(name, metadata);
            Ok(())
        })
        .await?;
        info!(key = %key_name, "key metadata updated");
        Ok(())
    }

    /// Remove one key's metadata. Returns whether it existed.
    pub async fn remove(&self, key_name: &str) -> Result<bool, KeywardError> {
        let removed = self.update(|map| Ok(map.remove(key_name).is_some())).await?;
        if removed {
            info!(key = %key_name, "key metadata removed");
        } else {
            warn!(key = %key_name, "no metadata to remove");
        }
        Ok(removed)
    }

    pub async fn get(&self, key_name: &str) -> Result<Option<KeyMetadata>, KeywardError> {
        Ok(self.read().await?.remove(key_name))
    }

    pub async fn has(&self, key_name: &str) -> Result<bool, KeywardError> {
        Ok(self.read().await?.contains_key(key_name))
    }

    pub async fn key_names(&self) -> Result<Vec<String>, KeywardError> {
        Ok(self.read().await?.into_keys().collect())
    }

    async fn write_locked(&self, map: &MetadataMap) -> Result<(), KeywardError> {
        validate_map(map).map_err(KeywardError::Validation)?;
        self.backup_current().await;

        let json = serde_json::to_string_pretty(map)?;
        write_atomic(&self.path, json.as_bytes(), self.io_timeout).await?;
        debug!(keys = map.len(), path = %self.path.display(), "metadata record written");
        Ok(())
    }

    /// Copy the current record into the archive. Failures are logged only.
    async fn backup_current(&self) {
        let content = match read_optional(&self.path, self.io_timeout).await {
            Ok(Some(content)) => content,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "could not read metadata record for backup");
                return;
            }
        };

        let name = format!("{}.backup-{}", self.file_name(), timestamp());
        let target = self.archive_dir().join(name);
        if let Err(e) = write_atomic(&target, content.as_bytes(), self.io_timeout).await {
            warn!(error = %e, "metadata backup failed");
            return;
        }
        if let Err(e) = self.prune_backups().await {
            warn!(error = %e, "pruning metadata backups failed");
        }
    }

    async fn prune_backups(&self) -> Result<(), KeywardError> {
        let archive = self.archive_dir();
        let prefix = format!("{}.backup-", self.file_name());
        let retention = self.backup_retention;

        with_timeout(self.io_timeout, async move {
            let mut backups = Vec::new();
            let mut entries = tokio::fs::read_dir(&archive).await?;
            while let Some(entry) = entries.next_entry().await? {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with(&prefix) {
                    backups.push(name);
                }
            }
            // Timestamps sort lexically.
            backups.sort();
            let excess = backups.len().saturating_sub(retention);
            for name in backups.into_iter().take(excess) {
                tokio::fs::remove_file(archive.join(&name)).await?;
                debug!(backup = %name, "old metadata backup removed");
            }
            Ok::<(), KeywardError>(())
        })
        .await
    }

    async fn quarantine(&self, content: &str) {
        let name = format!("{}.corrupt-{}", self.file_name(), timestamp());
        let target = self.archive_dir().join(name);
        match write_atomic(&target, content.as_bytes(), self.io_timeout).await {
            Ok(()) => warn!(copy = %target.display(), "corrupt metadata record quarantined"),
            Err(e) => error!(error = %e, "could not quarantine corrupt metadata record"),
        }
    }
}

fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H-%M-%S%.6fZ").to_string()
}

/// Parse and validate a persisted record.
///
/// Both malformed JSON and structurally invalid records are
/// [`KeywardError::MetadataCorruption`].
pub fn parse_record(content: &str) -> Result<MetadataMap, KeywardError> {
    let map = serde_json::from_str::<MetadataMap>(content)
        .map_err(|e| KeywardError::MetadataCorruption(e.to_string()))?;
    validate_map(&map).map_err(KeywardError::MetadataCorruption)?;
    Ok(map)
}

/// Structural checks that serde cannot express.
pub fn validate_map(map: &MetadataMap) -> Result<(), String> {
    for (name, metadata) in map {
        if name.trim().is_empty() {
            return Err("key name must not be empty".to_string());
        }
        if metadata.key_name != *name {
            return Err(format!(
                "record `{name}` carries mismatched keyName `{}`",
                metadata.key_name
            ));
        }
        let trail = &metadata.audit_trail;
        if trail.audit_events.len() > MAX_AUDIT_EVENTS {
            return Err(format!(
                "record `{name}` has {} audit events, limit is {MAX_AUDIT_EVENTS}",
                trail.audit_events.len()
            ));
        }
        if trail.health_check_history.len() > MAX_HEALTH_CHECKS {
            return Err(format!(
                "record `{name}` has {} health checks, limit is {MAX_HEALTH_CHECKS}",
                trail.health_check_history.len()
            ));
        }
    }
    Ok(())
}
