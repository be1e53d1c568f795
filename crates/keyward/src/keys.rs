// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keyward generate-key`, `info`, `access` and `repair`.

use keyward_core::KeywardError;
use keyward_keys::{RepairReport, StoreKeyRequest};
use keyward_vault::generate_secret_key;
use serde::Serialize;

use crate::App;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateKeyResponse {
    key_name: String,
    key_file: String,
    outcome: String,
}

pub async fn generate_key(
    app: &App,
    name: String,
    max_age: Option<i64>,
    rotate: bool,
    environments: Vec<String>,
    variables: Vec<String>,
) -> Result<(), KeywardError> {
    let key_file = app.config.environment.base_env_path();
    let outcome = app
        .lifecycle
        .store_base_environment_key(StoreKeyRequest {
            key_file: key_file.clone(),
            key_name: name.clone(),
            key_value: generate_secret_key()?,
            custom_max_age: max_age,
            rotate,
            environments_used_in: environments,
            dependent_variables: variables,
        })
        .await?;

    let response = GenerateKeyResponse {
        key_name: name,
        key_file: key_file.display().to_string(),
        outcome: outcome.to_string(),
    };
    if app.json {
        return app.print_json(&response);
    }
    println!(
        "{}: {} in {}",
        response.key_name, response.outcome, response.key_file
    );
    Ok(())
}

pub async fn info(app: &App, key: &str) -> Result<(), KeywardError> {
    let info = app
        .lifecycle
        .get_key_info(key)
        .await?
        .ok_or_else(|| KeywardError::NotFound(format!("no metadata for key `{key}`")))?;
    if app.json {
        return app.print_json(&info);
    }

    let md = &info.metadata;
    println!();
    println!("  {}", md.key_name);
    println!("  {}", "-".repeat(35));
    println!("    Created:       {}", md.created_at.to_rfc3339());
    if let Some(rotated) = md.last_rotated_at {
        println!("    Last rotated:  {}", rotated.to_rfc3339());
    }
    println!("    Rotations:     {}", md.rotation_count);
    println!(
        "    Age:           {} days (max {}, warn at {} left)",
        info.rotation_status.age_in_days,
        md.rotation_config.max_age_in_days,
        md.rotation_config.warning_threshold_in_days
    );
    println!(
        "    Expires in:    {} days",
        info.rotation_status.days_until_rotation
    );
    println!("    Status:        {}", md.status_tracking.current_status);
    println!(
        "    Audit events:  {}",
        info.audit_summary.total_audit_events
    );
    if !md.usage_tracking.environments_used_in.is_empty() {
        let envs: Vec<&str> = md
            .usage_tracking
            .environments_used_in
            .iter()
            .map(String::as_str)
            .collect();
        println!("    Environments:  {}", envs.join(", "));
    }
    println!();
    Ok(())
}

pub async fn access(app: &App, key: &str, source: &str) -> Result<(), KeywardError> {
    if !app.lifecycle.record_key_access(key, source).await? {
        return Err(KeywardError::NotFound(format!("no metadata for key `{key}`")));
    }
    if !app.json {
        println!("{key}: access recorded from {source}");
    }
    Ok(())
}

pub async fn repair(app: &App, key: Option<&str>) -> Result<(), KeywardError> {
    let report = match key {
        Some(key) => {
            let repaired = app.lifecycle.repair_key_config(key).await?;
            RepairReport {
                total_keys: 1,
                repaired_keys: if repaired { vec![key.to_string()] } else { Vec::new() },
                errors: Vec::new(),
            }
        }
        None => app.lifecycle.validate_and_repair_all_metadata().await?,
    };
    if app.json {
        return app.print_json(&report);
    }
    if report.repaired_keys.is_empty() {
        println!("{} key(s) checked, nothing to repair", report.total_keys);
    } else {
        println!(
            "{} key(s) checked, repaired: {}",
            report.total_keys,
            report.repaired_keys.join(", ")
        );
    }
    for failed in &report.errors {
        println!("  {}: {}", failed.key_name, failed.error);
    }
    Ok(())
}
