// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line-preserving codec for `KEY=value` environment files.
//!
//! Comments, blank lines and ordering survive a load/save cycle. Only lines
//! whose name is set through [`EnvFile::set`] are rewritten.

use std::path::Path;
use std::time::Duration;

use keyward_core::io::{read_optional, write_atomic};
use keyward_core::KeywardError;

/// An environment file held in memory as its original lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    lines: Vec<String>,
}

impl EnvFile {
    /// Parse file content.
    pub fn parse(content: &str) -> Self {
        Self {
            lines: content.lines().map(str::to_string).collect(),
        }
    }

    /// Load a file; a missing file is an empty `EnvFile`.
    pub async fn load(path: &Path, timeout: Duration) -> Result<Self, KeywardError> {
        let content = read_optional(path, timeout).await?;
        Ok(content.map(|c| Self::parse(&c)).unwrap_or_default())
    }

    /// Load a file that must exist.
    pub async fn load_existing(path: &Path, timeout: Duration) -> Result<Self, KeywardError> {
        match read_optional(path, timeout).await? {
            Some(content) => Ok(Self::parse(&content)),
            None => Err(KeywardError::NotFound(format!(
                "environment file {}",
                path.display()
            ))),
        }
    }

    /// Atomically write the file.
    pub async fn save(&self, path: &Path, timeout: Duration) -> Result<(), KeywardError> {
        write_atomic(path, self.render().as_bytes(), timeout).await
    }

    /// Render back to text with a trailing newline.
    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Value of the first `name=` line, with surrounding quotes removed.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.lines
            .iter()
            .find_map(|line| parse_line(line).filter(|(n, _)| *n == name))
            .map(|(_, value)| value)
    }

    /// Whether a `name=` line exists.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Replace the first `name=` line, or append one if absent.
    pub fn set(&mut self, name: &str, value: &str) {
        let replacement = format!("{name}={value}");
        let existing = self
            .lines
            .iter()
            .position(|line| parse_line(line).is_some_and(|(n, _)| n == name));
        match existing {
            Some(index) => self.lines[index] = replacement,
            None => self.lines.push(replacement),
        }
    }

    /// All `(name, value)` pairs in file order.
    pub fn variables(&self) -> Vec<(&str, &str)> {
        self.lines.iter().filter_map(|line| parse_line(line)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.variables().is_empty()
    }
}

/// Split a `NAME=value` line. Comments, blank lines and lines without `=` yield `None`.
fn parse_line(line: &str) -> Option<(&str, &str)> {
    if line.trim_start().starts_with('#') {
        return None;
    }
    let (name, value) = line.split_once('=')?;
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some((name, strip_quotes(value.trim())))
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
