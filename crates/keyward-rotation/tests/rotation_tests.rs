// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end rotation tests against a temp workspace.

use keyward_core::KeywardError;
use keyward_keys::{EventType, KeyStatus, RotationReason, Severity};
use keyward_rotation::{RotationOrchestrator, RotationRequest};
use keyward_test_utils::{TestHarness, DEFAULT_KEY_NAME};
use secrecy::{ExposeSecret, SecretString};

const NEW_KEY: &str = "rotated-secret-key-value-0002";

fn orchestrator(harness: &TestHarness) -> RotationOrchestrator {
    RotationOrchestrator::new(harness.engine.clone(), harness.lifecycle.clone())
}

fn new_key() -> SecretString {
    SecretString::from(NEW_KEY.to_string())
}

#[tokio::test]
async fn rotation_reencrypts_under_new_key() {
    let harness = TestHarness::builder()
        .with_encrypted_file(
            "uat.env",
            &[("PORTAL_USERNAME", "qa-admin"), ("PORTAL_PASSWORD", "p0rtal-pass")],
        )
        .with_encrypted_file("dev.env", &[("DB_PASSWORD", "dev-db-pass")])
        .build()
        .await
        .unwrap();
    let old_key = SecretString::from(harness.key_value.expose_secret().to_string());

    let request = RotationRequest::new(
        harness.key_file(),
        DEFAULT_KEY_NAME,
        new_key(),
        vec![harness.env_path("uat.env"), harness.env_path("dev.env")],
    )
    .reason(RotationReason::Scheduled);
    let outcome = orchestrator(&harness)
        .rotate_key_with_audit(request)
        .await
        .unwrap();

    assert_eq!(outcome.rotation_count, 1);
    assert_eq!(outcome.reencrypted_count, 3);
    assert_eq!(outcome.affected_files.len(), 2);
    assert!(outcome.skipped.is_empty());
    assert_ne!(outcome.old_key_hash, outcome.new_key_hash);

    let installed = harness.current_key().await.unwrap();
    assert_eq!(installed.expose_secret(), NEW_KEY);

    let plain = harness
        .decrypt_with("uat.env", "PORTAL_PASSWORD", &new_key())
        .await
        .unwrap();
    assert_eq!(plain, "p0rtal-pass");
    let err = harness
        .decrypt_with("uat.env", "PORTAL_PASSWORD", &old_key)
        .await
        .unwrap_err();
    assert!(matches!(err, KeywardError::Authentication));

    let md = harness.store.get(DEFAULT_KEY_NAME).await.unwrap().unwrap();
    assert_eq!(md.rotation_count, 1);
    assert!(md.last_rotated_at.is_some());
    assert_eq!(md.status_tracking.current_status, KeyStatus::Healthy);
    let rotation = md.audit_trail.rotation_history.last().unwrap();
    assert!(rotation.success);
    assert_eq!(rotation.reason, RotationReason::Scheduled);
    assert_eq!(rotation.new_key_hash.as_deref(), Some(outcome.new_key_hash.as_str()));
    let last = md.audit_trail.audit_events.last().unwrap();
    assert_eq!(last.event_type, EventType::Rotated);
    assert!(last.details.starts_with("Key rotated successfully. Reason: scheduled."));
}

#[tokio::test]
async fn undecryptable_variable_is_skipped() {
    let harness = TestHarness::builder()
        .with_encrypted_file("uat.env", &[("PORTAL_PASSWORD", "p0rtal-pass")])
        .build()
        .await
        .unwrap();
    // An envelope sealed under some other key.
    let foreign = harness
        .engine
        .encrypt("other", &SecretString::from("some-unrelated-key-xyz".to_string()))
        .await
        .unwrap();
    let path = harness.env_path("uat.env");
    let mut content = std::fs::read_to_string(&path).unwrap();
    content.push_str(&format!("LEGACY_TOKEN={foreign}\nAPI_URL=https://example.test\n"));
    std::fs::write(&path, content).unwrap();

    let outcome = orchestrator(&harness)
        .rotate_key_for_single_environment(
            RotationRequest::new(harness.key_file(), DEFAULT_KEY_NAME, new_key(), vec![]),
            harness.env_path("uat.env"),
        )
        .await
        .unwrap();

    assert_eq!(outcome.reencrypted_count, 1);
    assert_eq!(outcome.skipped.len(), 1);
    assert_eq!(outcome.skipped[0].variable, "LEGACY_TOKEN");
    assert_eq!(
        harness.read_value("uat.env", "LEGACY_TOKEN").await.unwrap(),
        foreign
    );
    assert_eq!(
        harness.read_value("uat.env", "API_URL").await.unwrap(),
        "https://example.test"
    );
}

#[tokio::test]
async fn include_plaintext_encrypts_plain_values() {
    let harness = TestHarness::builder()
        .with_raw_file("qa.env", "# qa settings\nAPI_TOKEN=plain-token\nEMPTY=\n")
        .build()
        .await
        .unwrap();

    let request = RotationRequest::new(
        harness.key_file(),
        DEFAULT_KEY_NAME,
        new_key(),
        vec![harness.env_path("qa.env")],
    )
    .include_plaintext(true);
    let outcome = orchestrator(&harness)
        .rotate_key_with_audit(request)
        .await
        .unwrap();

    assert_eq!(outcome.affected_variables, vec!["API_TOKEN"]);
    let plain = harness
        .decrypt_with("qa.env", "API_TOKEN", &new_key())
        .await
        .unwrap();
    assert_eq!(plain, "plain-token");
    assert_eq!(harness.read_value("qa.env", "EMPTY").await.unwrap(), "");
    let raw = std::fs::read_to_string(harness.env_path("qa.env")).unwrap();
    assert!(raw.starts_with("# qa settings\n"));

    let md = harness.store.get(DEFAULT_KEY_NAME).await.unwrap().unwrap();
    assert_eq!(
        md.audit_trail.rotation_history.last().unwrap().override_mode,
        Some(true)
    );
}

#[tokio::test]
async fn custom_max_age_is_applied() {
    let harness = TestHarness::builder().build().await.unwrap();

    let request =
        RotationRequest::new(harness.key_file(), DEFAULT_KEY_NAME, new_key(), vec![])
            .custom_max_age(30);
    orchestrator(&harness)
        .rotate_key_with_audit(request)
        .await
        .unwrap();

    let md = harness.store.get(DEFAULT_KEY_NAME).await.unwrap().unwrap();
    assert_eq!(md.rotation_config.max_age_in_days, 30);
}

#[tokio::test]
async fn invalid_custom_max_age_changes_nothing() {
    let harness = TestHarness::builder()
        .with_encrypted_file("uat.env", &[("PORTAL_PASSWORD", "p0rtal-pass")])
        .build()
        .await
        .unwrap();
    let before = std::fs::read_to_string(harness.env_path("uat.env")).unwrap();

    let request = RotationRequest::new(
        harness.key_file(),
        DEFAULT_KEY_NAME,
        new_key(),
        vec![harness.env_path("uat.env")],
    )
    .custom_max_age(3);
    let err = orchestrator(&harness)
        .rotate_key_with_audit(request)
        .await
        .unwrap_err();

    assert!(matches!(err, KeywardError::Config(_)));
    assert_eq!(
        std::fs::read_to_string(harness.env_path("uat.env")).unwrap(),
        before
    );
    assert_eq!(
        harness.current_key().await.unwrap().expose_secret(),
        harness.key_value.expose_secret()
    );
}

#[tokio::test]
async fn unknown_key_is_not_found() {
    let harness = TestHarness::builder().build().await.unwrap();
    let request = RotationRequest::new(harness.key_file(), "MISSING_KEY", new_key(), vec![]);
    let err = orchestrator(&harness)
        .rotate_key_with_audit(request)
        .await
        .unwrap_err();
    assert!(matches!(err, KeywardError::NotFound(_)));
}

#[tokio::test]
async fn missing_target_file_marks_key_critical() {
    let harness = TestHarness::builder()
        .with_encrypted_file("uat.env", &[("PORTAL_PASSWORD", "p0rtal-pass")])
        .build()
        .await
        .unwrap();

    let request = RotationRequest::new(
        harness.key_file(),
        DEFAULT_KEY_NAME,
        new_key(),
        vec![harness.env_path("uat.env"), harness.env_path("gone.env")],
    );
    let err = orchestrator(&harness)
        .rotate_key_with_audit(request)
        .await
        .unwrap_err();
    assert!(matches!(err, KeywardError::NotFound(_)));

    // Nothing was installed or committed.
    assert_eq!(
        harness.current_key().await.unwrap().expose_secret(),
        harness.key_value.expose_secret()
    );
    let plain = harness
        .decrypt_with("uat.env", "PORTAL_PASSWORD", &harness.key_value)
        .await
        .unwrap();
    assert_eq!(plain, "p0rtal-pass");

    let md = harness.store.get(DEFAULT_KEY_NAME).await.unwrap().unwrap();
    assert_eq!(md.rotation_count, 0);
    assert_eq!(md.status_tracking.current_status, KeyStatus::Critical);
    let rotation = md.audit_trail.rotation_history.last().unwrap();
    assert!(!rotation.success);
    assert!(rotation.error_details.is_some());
    let last = md.audit_trail.audit_events.last().unwrap();
    assert_eq!(last.severity, Severity::Error);
}

#[tokio::test]
async fn key_that_does_not_read_back_fails_integrity_check() {
    let harness = TestHarness::builder()
        .with_encrypted_file("uat.env", &[("PORTAL_PASSWORD", "p0rtal-pass")])
        .build()
        .await
        .unwrap();

    // A line break splits the stored line, so the value read back differs.
    let broken = SecretString::from("first-half-of-key\nSECOND=half".to_string());
    let request = RotationRequest::new(
        harness.key_file(),
        DEFAULT_KEY_NAME,
        broken,
        vec![harness.env_path("uat.env")],
    );
    let err = orchestrator(&harness)
        .rotate_key_with_audit(request)
        .await
        .unwrap_err();
    assert!(matches!(err, KeywardError::RotationIntegrity(_)));

    assert_eq!(
        harness.current_key().await.unwrap().expose_secret(),
        harness.key_value.expose_secret()
    );
    let plain = harness
        .decrypt_with("uat.env", "PORTAL_PASSWORD", &harness.key_value)
        .await
        .unwrap();
    assert_eq!(plain, "p0rtal-pass");

    let md = harness.store.get(DEFAULT_KEY_NAME).await.unwrap().unwrap();
    assert_eq!(md.status_tracking.current_status, KeyStatus::Critical);
}

#[tokio::test]
async fn rotating_to_the_current_key_fails_integrity_check() {
    let harness = TestHarness::builder()
        .with_encrypted_file("uat.env", &[("PORTAL_PASSWORD", "p0rtal-pass")])
        .build()
        .await
        .unwrap();
    let before = std::fs::read_to_string(harness.env_path("uat.env")).unwrap();

    let same = SecretString::from(harness.key_value.expose_secret().to_string());
    let request = RotationRequest::new(
        harness.key_file(),
        DEFAULT_KEY_NAME,
        same,
        vec![harness.env_path("uat.env")],
    );
    let err = orchestrator(&harness)
        .rotate_key_with_audit(request)
        .await
        .unwrap_err();
    assert!(matches!(err, KeywardError::RotationIntegrity(_)));
    assert_eq!(std::fs::read_to_string(harness.env_path("uat.env")).unwrap(), before);

    let md = harness.store.get(DEFAULT_KEY_NAME).await.unwrap().unwrap();
    assert_eq!(md.rotation_count, 0);
    let attempt = md.audit_trail.rotation_history.last().unwrap();
    assert!(!attempt.success);
}

#[tokio::test]
async fn key_file_cannot_be_a_target() {
    let harness = TestHarness::builder().build().await.unwrap();
    let request = RotationRequest::new(
        harness.key_file(),
        DEFAULT_KEY_NAME,
        new_key(),
        vec![harness.key_file()],
    );
    let err = orchestrator(&harness)
        .rotate_key_with_audit(request)
        .await
        .unwrap_err();
    assert!(matches!(err, KeywardError::Validation(_)));
}

/// `dir/../<dir name>/file` spelling of an existing path.
fn respelled(path: &std::path::Path) -> std::path::PathBuf {
    let dir = path.parent().unwrap();
    dir.join("..")
        .join(dir.file_name().unwrap())
        .join(path.file_name().unwrap())
}

#[tokio::test]
async fn key_file_is_rejected_under_another_spelling() {
    let harness = TestHarness::builder()
        .with_encrypted_file("uat.env", &[("PORTAL_PASSWORD", "p0rtal-pass")])
        .build()
        .await
        .unwrap();
    let request = RotationRequest::new(
        harness.key_file(),
        DEFAULT_KEY_NAME,
        new_key(),
        vec![harness.env_path("uat.env"), respelled(&harness.key_file())],
    );
    let err = orchestrator(&harness)
        .rotate_key_with_audit(request)
        .await
        .unwrap_err();
    assert!(matches!(err, KeywardError::Validation(_)), "{err:?}");

    let key = harness.current_key().await.unwrap();
    assert_eq!(key.expose_secret(), harness.key_value.expose_secret());
}

#[tokio::test]
async fn duplicate_targets_are_rotated_once() {
    let harness = TestHarness::builder()
        .with_encrypted_file(
            "uat.env",
            &[("PORTAL_USERNAME", "qa-admin"), ("PORTAL_PASSWORD", "p0rtal-pass")],
        )
        .build()
        .await
        .unwrap();
    let uat = harness.env_path("uat.env");

    let request = RotationRequest::new(
        harness.key_file(),
        DEFAULT_KEY_NAME,
        new_key(),
        vec![uat.clone(), uat.clone(), respelled(&uat)],
    );
    let outcome = orchestrator(&harness)
        .rotate_key_with_audit(request)
        .await
        .unwrap();

    assert_eq!(outcome.reencrypted_count, 2);
    assert_eq!(outcome.affected_files, vec![uat]);
    assert_eq!(
        outcome.affected_variables,
        vec!["PORTAL_USERNAME".to_string(), "PORTAL_PASSWORD".to_string()]
    );
    assert!(outcome.skipped.is_empty());
    assert_eq!(
        harness
            .decrypt_with("uat.env", "PORTAL_PASSWORD", &new_key())
            .await
            .unwrap(),
        "p0rtal-pass"
    );
}

#[tokio::test]
async fn weak_new_key_is_rejected_before_anything_runs() {
    let harness = TestHarness::builder().build().await.unwrap();
    let request = RotationRequest::new(
        harness.key_file(),
        DEFAULT_KEY_NAME,
        SecretString::from("changeme".to_string()),
        vec![],
    );
    let err = orchestrator(&harness)
        .rotate_key_with_audit(request)
        .await
        .unwrap_err();
    assert!(matches!(err, KeywardError::Validation(_)));

    let md = harness.store.get(DEFAULT_KEY_NAME).await.unwrap().unwrap();
    assert!(md.audit_trail.rotation_history.is_empty());
    assert_eq!(md.status_tracking.current_status, KeyStatus::Healthy);
}

#[tokio::test]
async fn consecutive_rotations_count_up() {
    let harness = TestHarness::builder()
        .with_encrypted_file("uat.env", &[("PORTAL_PASSWORD", "p0rtal-pass")])
        .build()
        .await
        .unwrap();
    let orchestrator = orchestrator(&harness);

    for (i, key) in ["second-generation-key-aaaa", "third-generation-key-bbbb"]
        .iter()
        .enumerate()
    {
        let request = RotationRequest::new(
            harness.key_file(),
            DEFAULT_KEY_NAME,
            SecretString::from(key.to_string()),
            vec![harness.env_path("uat.env")],
        );
        let outcome = orchestrator.rotate_key_with_audit(request).await.unwrap();
        assert_eq!(outcome.rotation_count, i as u64 + 1);
    }

    let plain = harness
        .decrypt_with(
            "uat.env",
            "PORTAL_PASSWORD",
            &SecretString::from("third-generation-key-bbbb".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(plain, "p0rtal-pass");
    assert!(!orchestrator.locks().is_locked(DEFAULT_KEY_NAME));
}
