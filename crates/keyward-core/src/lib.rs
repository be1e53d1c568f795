// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Keyward credential-protection engine.
//!
//! This crate provides the error taxonomy and the timeout-bounded, atomic
//! file helpers used throughout the Keyward workspace.

pub mod error;
pub mod io;

// Re-export key items at crate root for ergonomic imports.
pub use error::KeywardError;
