// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keyward status`, `keyward audit` and `keyward check` command implementations.
//!
//! With `--json` both print the structured result for scripting; otherwise a
//! short table, colored when stdout is a terminal.

use keyward_core::KeywardError;
use keyward_keys::{CheckSource, RotationStatus, SystemHealth};
use serde::Serialize;

use crate::App;

/// Structured output of `keyward status <key>`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStatusResponse {
    pub key_name: String,
    #[serde(flatten)]
    pub status: RotationStatus,
}

/// Display label for a status check result.
fn label(status: &RotationStatus) -> &'static str {
    if status.needs_rotation {
        "expired"
    } else if status.needs_warning {
        "warning"
    } else {
        "healthy"
    }
}

pub async fn status(app: &App, key: Option<&str>) -> Result<(), KeywardError> {
    let Some(key) = key else {
        let sweep = app.lifecycle.check_all_keys_for_rotation().await?;
        if app.json {
            return app.print_json(&sweep);
        }
        println!();
        println!("  keyward status");
        println!("  {}", "-".repeat(35));
        if sweep.keys_needing_rotation.is_empty() && sweep.keys_needing_warning.is_empty() {
            print_line("all keys", SystemHealth::Healthy, "within rotation policy", app.color);
        }
        for name in &sweep.keys_needing_rotation {
            print_line(name, SystemHealth::Critical, "rotate now", app.color);
        }
        for name in &sweep.keys_needing_warning {
            print_line(name, SystemHealth::Warning, "rotate soon", app.color);
        }
        println!();
        return Ok(());
    };

    if !app.lifecycle.store().has(key).await? {
        return Err(KeywardError::NotFound(format!("no metadata for key `{key}`")));
    }
    let status = app
        .lifecycle
        .check_key_rotation_status(key, CheckSource::Manual)
        .await?;
    if app.json {
        return app.print_json(&KeyStatusResponse {
            key_name: key.to_string(),
            status,
        });
    }

    let health = if status.needs_rotation {
        SystemHealth::Critical
    } else if status.needs_warning {
        SystemHealth::Warning
    } else {
        SystemHealth::Healthy
    };
    let detail = format!(
        "{} ({} days old, {} days left)",
        label(&status),
        status.age_in_days,
        status.days_until_rotation
    );
    println!();
    print_line(key, health, &detail, app.color);
    println!();
    Ok(())
}

pub async fn audit(app: &App) -> Result<(), KeywardError> {
    let report = app.lifecycle.perform_comprehensive_audit().await?;
    if app.json {
        return app.print_json(&report);
    }

    let summary = &report.audit_summary;
    println!();
    println!("  keyward audit");
    println!("  {}", "-".repeat(35));
    print_line(
        "system",
        report.system_health,
        &report.system_health.to_string(),
        app.color,
    );
    println!(
        "    Keys:     {} total, {} healthy, {} warning, {} critical, {} expired",
        summary.total_keys,
        summary.healthy_keys,
        summary.warning_keys,
        summary.critical_keys,
        summary.expired_keys
    );
    println!(
        "    Age:      avg {:.2} days, oldest {}, newest {}",
        summary.average_key_age, summary.oldest_key_age, summary.newest_key_age
    );
    println!(
        "    Activity: {} rotations, {} audit events",
        summary.total_rotations, summary.total_audit_events
    );
    if !report.recommendations.is_empty() {
        println!();
        for recommendation in &report.recommendations {
            println!("    - {recommendation}");
        }
    }
    println!();
    Ok(())
}

/// Fails when any tracked key is past its maximum age.
pub async fn check(app: &App) -> Result<(), KeywardError> {
    let check = app.lifecycle.perform_startup_security_check().await?;
    if app.json {
        app.print_json(&check)?;
    } else {
        println!();
        println!("  keyward check");
        println!("  {}", "-".repeat(35));
        print_line(
            "system",
            check.system_health,
            if check.passed { "passed" } else { "failed" },
            app.color,
        );
        for name in &check.critical_keys {
            print_line(name, SystemHealth::Critical, "rotate now", app.color);
        }
        for name in &check.warning_keys {
            print_line(name, SystemHealth::Warning, "rotate soon", app.color);
        }
        for recommendation in &check.recommendations {
            println!("    - {recommendation}");
        }
        println!();
    }

    if check.passed {
        Ok(())
    } else {
        Err(KeywardError::Validation(format!(
            "startup security check failed; rotate now: {}",
            check.critical_keys.join(", ")
        )))
    }
}

fn print_line(name: &str, health: SystemHealth, detail: &str, use_color: bool) {
    if use_color {
        use colored::Colorize;
        let (symbol, detail) = match health {
            SystemHealth::Healthy => ("✓".green(), detail.green()),
            SystemHealth::Warning => ("!".yellow(), detail.yellow()),
            SystemHealth::Critical => ("✗".red(), detail.red()),
        };
        println!("    {symbol} {name:<24} {detail}");
    } else {
        let tag = match health {
            SystemHealth::Healthy => "[OK]  ",
            SystemHealth::Warning => "[WARN]",
            SystemHealth::Critical => "[FAIL]",
        };
        println!("    {tag} {name:<24} {detail}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(needs_rotation: bool, needs_warning: bool) -> RotationStatus {
        RotationStatus {
            needs_rotation,
            needs_warning,
            age_in_days: 83,
            days_until_rotation: 7,
        }
    }

    #[test]
    fn labels_follow_status() {
        assert_eq!(label(&status(true, false)), "expired");
        assert_eq!(label(&status(false, true)), "warning");
        assert_eq!(label(&status(false, false)), "healthy");
    }

    #[test]
    fn key_status_response_flattens() {
        let resp = KeyStatusResponse {
            key_name: "DEV_SECRET_KEY".to_string(),
            status: status(false, true),
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"keyName\":\"DEV_SECRET_KEY\""));
        assert!(json.contains("\"needsWarning\":true"));
        assert!(json.contains("\"daysUntilRotation\":7"));
    }
}
