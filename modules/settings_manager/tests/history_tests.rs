//! History trail and restore-to-version tests

mod common;

use common::Harness;
use serde_json::json;
use settings_manager::contract::{HistoryAction, SettingType, SettingsError};
use settings_manager::domain::audit;
use settings_manager::domain::SettingEvent;

#[tokio::test]
async fn test_every_write_appends_one_record() {
    let h = Harness::new();
    h.manager.set("site.name", json!("v1"), None).await.unwrap();
    h.manager.set("site.name", json!("v2"), None).await.unwrap();
    h.manager.set("site.name", json!("v3"), None).await.unwrap();

    let history = h.manager.get_history("site.name", 50).await.unwrap();
    assert_eq!(history.len(), 3);

    let actions: Vec<HistoryAction> = history.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![HistoryAction::Updated, HistoryAction::Updated, HistoryAction::Created]
    );
    assert_eq!(history[0].old_value.as_deref(), Some("v2"));
    assert_eq!(history[0].new_value.as_deref(), Some("v3"));
    assert_eq!(history[2].old_value, None);
    assert_eq!(history[2].old_type, None);
}

#[tokio::test]
async fn test_history_limits_and_cross_key_listing() {
    let h = Harness::new();
    for i in 0..5 {
        h.manager.set("counter", json!(i), None).await.unwrap();
    }
    h.manager.set("other", json!("x"), None).await.unwrap();

    assert_eq!(h.manager.get_history("counter", 2).await.unwrap().len(), 2);

    let recent = h.manager.get_all_history(3).await.unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].setting_key, "other");
    assert_eq!(recent[1].setting_key, "counter");
}

#[tokio::test]
async fn test_restore_writes_old_value_back() {
    let h = Harness::new();
    h.manager.set("site.name", json!("v1"), None).await.unwrap();
    h.manager.set("site.name", json!("v2"), None).await.unwrap();
    h.manager.set("site.name", json!("v3"), None).await.unwrap();

    let history = h.manager.get_history("site.name", 50).await.unwrap();
    let v1_to_v2 = &history[1];
    assert_eq!(audit::old_value(v1_to_v2), json!("v1"));

    h.manager.get("site.name", None).await.unwrap();
    let restored = h
        .manager
        .restore_to_version("site.name", v1_to_v2.id)
        .await
        .unwrap();

    assert_eq!(restored.value.as_deref(), Some("v1"));
    assert_eq!(h.manager.get("site.name", None).await.unwrap(), json!("v1"));
    assert_eq!(h.history.count(), 3);

    match h.events.events().last() {
        Some(SettingEvent::Updated(e)) => assert_eq!(e.key, "site.name"),
        other => panic!("expected update event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_restore_keeps_typed_value() {
    let h = Harness::new();
    h.manager.set("limit", json!(10), None).await.unwrap();
    h.manager.set("limit", json!("unlimited"), None).await.unwrap();

    let latest = h.manager.get_history("limit", 1).await.unwrap().remove(0);
    assert_eq!(latest.old_type, Some(SettingType::Int));

    let restored = h.manager.restore_to_version("limit", latest.id).await.unwrap();
    assert_eq!(restored.r#type, SettingType::Int);
    assert_eq!(h.manager.get("limit", None).await.unwrap(), json!(10));
}

#[tokio::test]
async fn test_restore_recreates_deleted_setting() {
    let h = Harness::new();
    h.manager.set("gone", json!(true), None).await.unwrap();
    h.manager.forget("gone").await.unwrap();

    let deletion = h.manager.get_history("gone", 1).await.unwrap().remove(0);
    assert_eq!(deletion.action, HistoryAction::Deleted);

    h.manager.restore_to_version("gone", deletion.id).await.unwrap();
    assert_eq!(h.manager.get("gone", None).await.unwrap(), json!(true));
    assert!(matches!(
        h.events.events().last(),
        Some(SettingEvent::Created(_))
    ));
}

#[tokio::test]
async fn test_restore_rejects_record_of_another_key() {
    let h = Harness::new();
    h.manager.set("a", json!(1), None).await.unwrap();
    h.manager.set("b", json!(2), None).await.unwrap();
    let record_for_a = h.manager.get_history("a", 1).await.unwrap().remove(0);

    let err = h
        .manager
        .restore_to_version("b", record_for_a.id)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SettingsError::IdentityMismatch {
            key: "b".to_string(),
            history_key: "a".to_string(),
        }
    );
    assert_eq!(h.manager.get("b", None).await.unwrap(), json!(2));
}

#[tokio::test]
async fn test_restore_unknown_record_is_not_found() {
    let h = Harness::new();
    let err = h.manager.restore_to_version("a", 999).await.unwrap_err();

    assert!(matches!(err, SettingsError::NotFound { ref resource, .. } if resource == "setting_history"));
}

#[tokio::test]
async fn test_restore_skips_validation_and_keeps_metadata() {
    let h = Harness::new();
    h.manager.set("contact", json!("nobody"), Some("mail")).await.unwrap();
    h.manager
        .set_with_metadata(
            settings_manager::domain::SettingDefinition::new("contact", "ops@example.com")
                .group("mail")
                .rules(vec![json!("email")])
                .order(3),
        )
        .await
        .unwrap();

    let update = h.manager.get_history("contact", 1).await.unwrap().remove(0);
    let restored = h.manager.restore_to_version("contact", update.id).await.unwrap();

    assert_eq!(restored.value.as_deref(), Some("nobody"));
    assert_eq!(restored.group.as_deref(), Some("mail"));
    assert_eq!(restored.order, 3);
    assert_eq!(restored.validation_rules, Some(vec![json!("email")]));
}

#[tokio::test]
async fn test_create_update_delete_trail() {
    let h = Harness::new();
    h.manager.set("k", json!("a"), None).await.unwrap();
    h.manager.set("k", json!("b"), None).await.unwrap();
    assert!(h.manager.forget("k").await.unwrap());

    let mut trail = h.manager.get_history("k", 10).await.unwrap();
    trail.reverse();
    let actions: Vec<HistoryAction> = trail.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![HistoryAction::Created, HistoryAction::Updated, HistoryAction::Deleted]
    );

    let updated = &trail[1];
    assert_eq!(audit::old_value(updated), json!("a"));
    assert_eq!(audit::new_value(updated), json!("b"));
    assert_eq!(audit::old_value(&trail[2]), json!("b"));
    assert_eq!(audit::new_value(&trail[2]), serde_json::Value::Null);
}

#[tokio::test]
async fn test_restoring_deleted_encrypted_setting_brings_back_ciphertext() {
    let h = Harness::new();
    h.manager
        .set_encrypted("api.key", json!("s3cret"), None)
        .await
        .unwrap();
    let ciphertext = h.settings.raw("api.key").unwrap().value.unwrap();
    h.manager.forget("api.key").await.unwrap();

    let deletion = h.manager.get_history("api.key", 1).await.unwrap().remove(0);
    let restored = h
        .manager
        .restore_to_version("api.key", deletion.id)
        .await
        .unwrap();

    // No live entry to inherit the flag from, so the stored text is plain.
    assert!(!restored.encrypted);
    assert_eq!(restored.value.as_deref(), Some(ciphertext.as_str()));
    assert_eq!(h.manager.get("api.key", None).await.unwrap(), json!(ciphertext));
    assert_eq!(
        h.manager
            .encrypted("api.key", Some(json!("DEFAULT")))
            .await
            .unwrap(),
        json!("DEFAULT")
    );
}
