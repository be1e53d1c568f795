// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plaintext values held between decryption and re-encryption.

use std::fmt;

use secrecy::SecretString;
use tracing::debug;

/// One decrypted variable from one target file.
pub struct DecryptedValue {
    /// Index into the rotation's target file list.
    pub file: usize,
    pub variable: String,
    pub value: SecretString,
}

/// Decrypted values for a single rotation call.
///
/// Values are [`SecretString`]s, so each one is zeroized when the batch is
/// dropped, whichever way the rotation exits.
#[derive(Default)]
pub struct DecryptedBatch {
    values: Vec<DecryptedValue>,
}

impl DecryptedBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: usize, variable: impl Into<String>, value: SecretString) {
        self.values.push(DecryptedValue {
            file,
            variable: variable.into(),
            value,
        });
    }

    /// Values captured from the target file at `file`.
    pub fn for_file(&self, file: usize) -> impl Iterator<Item = &DecryptedValue> {
        self.values.iter().filter(move |v| v.file == file)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for DecryptedBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptedBatch")
            .field("values", &self.values.len())
            .finish()
    }
}

impl Drop for DecryptedBatch {
    fn drop(&mut self) {
        if !self.values.is_empty() {
            debug!(values = self.values.len(), "decrypted batch cleared");
        }
    }
}
