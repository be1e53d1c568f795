// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keyward encrypt` and `keyward decrypt`.

use keyward_core::io::canonical_path;
use keyward_core::KeywardError;
use keyward_vault::{protect_file, EnvFile, ProtectOptions};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::App;

/// Read the value of `key_name` from the configured key file.
pub async fn load_key(app: &App, key_name: &str) -> Result<SecretString, KeywardError> {
    let path = app.config.environment.base_env_path();
    let file = EnvFile::load_existing(&path, app.config.environment.io_timeout()).await?;
    file.get(key_name)
        .filter(|v| !v.is_empty())
        .map(|v| SecretString::from(v.to_string()))
        .ok_or_else(|| {
            KeywardError::NotFound(format!("key `{key_name}` not found in {}", path.display()))
        })
}

pub async fn encrypt(
    app: &App,
    file: &str,
    key_name: &str,
    variables: Vec<String>,
    force: bool,
) -> Result<(), KeywardError> {
    let env = &app.config.environment;
    let path = env.resolve(file);
    let key_file = env.base_env_path();
    if canonical_path(&path, env.io_timeout()).await?
        == canonical_path(&key_file, env.io_timeout()).await?
    {
        return Err(KeywardError::Validation(format!(
            "{} holds the protecting keys and cannot be encrypted",
            key_file.display()
        )));
    }
    let secret = load_key(app, key_name).await?;
    let report = protect_file(
        &app.engine,
        &path,
        &secret,
        &ProtectOptions {
            variables,
            force_reencrypt: force,
            exclude: vec![key_name.to_string()],
        },
        app.config.environment.io_timeout(),
    )
    .await?;
    app.lifecycle.record_key_access(key_name, "encrypt").await?;
    info!(
        file = %path.display(),
        encrypted = report.encrypted.len(),
        reencrypted = report.reencrypted.len(),
        "credential file protected"
    );

    if app.json {
        return app.print_json(&report);
    }
    println!(
        "{}: {} encrypted, {} re-encrypted, {} skipped",
        path.display(),
        report.encrypted.len(),
        report.reencrypted.len(),
        report.skipped.len()
    );
    if !report.missing.is_empty() {
        println!("  not found: {}", report.missing.join(", "));
    }
    Ok(())
}

pub async fn decrypt(
    app: &App,
    file: &str,
    variable: &str,
    key_name: &str,
) -> Result<(), KeywardError> {
    let secret = load_key(app, key_name).await?;
    let path = app.config.environment.resolve(file);
    let env = EnvFile::load_existing(&path, app.config.environment.io_timeout()).await?;
    let value = env.get(variable).ok_or_else(|| {
        KeywardError::NotFound(format!("`{variable}` not found in {}", path.display()))
    })?;

    let plain = app.engine.decrypt(value, &secret).await?;
    app.lifecycle.record_key_access(key_name, "decrypt").await?;
    println!("{}", plain.expose_secret());
    Ok(())
}
