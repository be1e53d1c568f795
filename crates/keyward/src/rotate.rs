// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keyward rotate` command implementation.

use keyward_core::KeywardError;
use keyward_keys::RotationReason;
use keyward_rotation::RotationRequest;
use keyward_vault::generate_secret_key;

use crate::App;

/// Generate a new key and rotate `key_name` across `files`.
pub async fn rotate(
    app: &App,
    key_name: &str,
    files: &[String],
    reason: RotationReason,
    max_age: Option<i64>,
    include_plaintext: bool,
) -> Result<(), KeywardError> {
    let env = &app.config.environment;
    let mut request = RotationRequest::new(
        env.base_env_path(),
        key_name,
        generate_secret_key()?,
        files.iter().map(|f| env.resolve(f)).collect(),
    )
    .reason(reason)
    .include_plaintext(include_plaintext);
    if let Some(days) = max_age {
        request = request.custom_max_age(days);
    }

    let outcome = app.orchestrator.rotate_key_with_audit(request).await?;
    if app.json {
        return app.print_json(&outcome);
    }

    println!(
        "{}: rotated (#{}), {} value(s) re-encrypted in {} file(s)",
        outcome.key_name,
        outcome.rotation_count,
        outcome.reencrypted_count,
        outcome.affected_files.len()
    );
    for skipped in &outcome.skipped {
        println!(
            "  skipped {} in {}: {}",
            skipped.variable,
            skipped.file.display(),
            skipped.error
        );
    }
    Ok(())
}
