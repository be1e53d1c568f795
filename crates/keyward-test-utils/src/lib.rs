// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Keyward integration tests.
//!
//! [`TestHarness`] builds an isolated workspace with a stored key, tracked
//! metadata and encrypted credential files, using cheap Argon2 parameters.

pub mod harness;

pub use harness::{TestHarness, TestHarnessBuilder, DEFAULT_KEY_NAME, DEFAULT_KEY_VALUE};
