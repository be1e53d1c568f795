// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timeout-bounded file helpers shared by the metadata store and env-file codec.
//!
//! Every write goes through [`write_atomic`]: content is written to a temp file
//! in the destination directory and renamed over the target, so readers never
//! observe a half-written file.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::error::KeywardError;

/// Run an I/O future with a deadline.
pub async fn with_timeout<T, F>(duration: Duration, fut: F) -> Result<T, KeywardError>
where
    F: Future<Output = Result<T, KeywardError>>,
{
    match tokio::time::timeout(duration, fut).await {
        Ok(result) => result,
        Err(_) => Err(KeywardError::Timeout { duration }),
    }
}

/// Read a file as UTF-8, returning `None` when it does not exist.
pub async fn read_optional(path: &Path, timeout: Duration) -> Result<Option<String>, KeywardError> {
    with_timeout(timeout, async {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(KeywardError::Io(e)),
        }
    })
    .await
}

/// Resolve symlinks and relative components of `path`.
///
/// A path that does not exist yet is returned unchanged, so two spellings of
/// a missing file only compare equal when they are identical.
pub async fn canonical_path(path: &Path, timeout: Duration) -> Result<PathBuf, KeywardError> {
    with_timeout(timeout, async {
        match tokio::fs::canonicalize(path).await {
            Ok(resolved) => Ok(resolved),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(path.to_path_buf()),
            Err(e) => Err(KeywardError::Io(e)),
        }
    })
    .await
}

/// Atomically replace `path` with `data`.
///
/// The parent directory is created if missing. On Unix the file ends up with
/// mode 0600 since it holds key material or ciphertext.
pub async fn write_atomic(path: &Path, data: &[u8], timeout: Duration) -> Result<(), KeywardError> {
    let path = path.to_path_buf();
    let data = data.to_vec();
    with_timeout(timeout, async move {
        tokio::task::spawn_blocking(move || write_atomic_blocking(&path, &data))
            .await
            .map_err(|e| KeywardError::Internal(format!("atomic write task failed: {e}")))?
    })
    .await
}

fn write_atomic_blocking(path: &Path, data: &[u8]) -> Result<(), KeywardError> {
    use std::io::Write;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o600))?;
    }

    tmp.persist(path).map_err(|e| KeywardError::Io(e.error))?;
    debug!(path = %path.display(), bytes = data.len(), "file replaced atomically");
    Ok(())
}
