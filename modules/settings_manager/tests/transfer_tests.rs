//! Import/export tests

mod common;

use common::Harness;
use serde_json::{json, Value};
use settings_manager::contract::SettingsError;
use settings_manager::domain::{ExportOptions, ImportOptions, SettingDefinition};

async fn seeded() -> Harness {
    let h = Harness::new();
    h.manager
        .set_with_metadata(
            SettingDefinition::new("site.name", "Shop")
                .group("site")
                .rules(vec![json!("required"), json!("string")])
                .public(true)
                .order(1),
        )
        .await
        .unwrap();
    h.manager.set("site.items", json!([1, 2, 3]), Some("site")).await.unwrap();
    h.manager.set("mail.port", json!(587), Some("mail")).await.unwrap();
    h.manager.set_encrypted("mail.password", json!("hunter2"), Some("mail")).await.unwrap();
    h
}

fn records(output: &str) -> Vec<Value> {
    match serde_json::from_str(output).unwrap() {
        Value::Array(items) => items,
        other => panic!("expected a list, got {}", other),
    }
}

#[tokio::test]
async fn test_export_json_with_metadata_skips_encrypted() {
    let h = seeded().await;
    let output = h.manager.export("json", &ExportOptions::default()).await.unwrap();
    let items = records(&output);

    let keys: Vec<&str> = items.iter().filter_map(|r| r["key"].as_str()).collect();
    assert_eq!(keys.len(), 3);
    assert!(!keys.contains(&"mail.password"));

    let name = items.iter().find(|r| r["key"] == "site.name").unwrap();
    assert_eq!(name["value"], json!("Shop"));
    assert_eq!(name["type"], json!("string"));
    assert_eq!(name["is_public"], json!(true));
    assert_eq!(name["validation_rules"], json!(["required", "string"]));

    let items_record = items.iter().find(|r| r["key"] == "site.items").unwrap();
    assert_eq!(items_record["value"], json!([1, 2, 3]));
}

#[tokio::test]
async fn test_export_minimal_records_and_group_filter() {
    let h = seeded().await;
    let options = ExportOptions {
        include_metadata: Some(false),
        include_encrypted: Some(true),
        group: Some("mail".to_string()),
    };
    let items = records(&h.manager.export("json", &options).await.unwrap());

    assert_eq!(items.len(), 2);
    for item in &items {
        let fields: Vec<&String> = item.as_object().unwrap().keys().collect();
        assert_eq!(fields.len(), 3);
        assert_eq!(item["group"], json!("mail"));
    }
    let port = items.iter().find(|r| r["key"] == "mail.port").unwrap();
    assert_eq!(port["value"], json!(587));
}

#[tokio::test]
async fn test_export_yaml() {
    let h = seeded().await;
    let output = h.manager.export("yaml", &ExportOptions::default()).await.unwrap();

    let parsed: Value = serde_yaml::from_str(&output).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 3);
    assert!(output.contains("site.name"));
}

#[tokio::test]
async fn test_unsupported_format_is_rejected() {
    let h = seeded().await;

    let err = h.manager.export("xml", &ExportOptions::default()).await.unwrap_err();
    assert_eq!(err, SettingsError::UnsupportedFormat { format: "xml".to_string() });

    let err = h
        .manager
        .import("<settings/>", "xml", &ImportOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SettingsError::UnsupportedFormat { .. }));
}

#[tokio::test]
async fn test_roundtrip_into_fresh_store_including_encrypted() {
    let source = seeded().await;
    let options = ExportOptions {
        include_encrypted: Some(true),
        ..ExportOptions::default()
    };
    let document = source.manager.export("json", &options).await.unwrap();

    let target = Harness::new();
    let summary = target
        .manager
        .import(&document, "json", &ImportOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.imported.len(), 4);
    assert!(summary.skipped.is_empty());

    let m = &target.manager;
    assert_eq!(m.get("site.items", None).await.unwrap(), json!([1, 2, 3]));
    assert_eq!(m.get("mail.port", None).await.unwrap(), json!(587));
    assert_eq!(m.encrypted("mail.password", None).await.unwrap(), json!("hunter2"));

    let name = m.find("site.name").await.unwrap().unwrap();
    assert!(name.is_public);
    assert_eq!(name.order, 1);
    assert_eq!(name.group.as_deref(), Some("site"));
}

#[tokio::test]
async fn test_import_without_overwrite_skips_existing() {
    let h = Harness::new();
    h.manager.set("a", json!("keep"), None).await.unwrap();

    let document = r#"[{"key": "a", "value": "replace"}, {"key": "b", "value": 2}]"#;
    let summary = h
        .manager
        .import(document, "json", &ImportOptions { overwrite: false })
        .await
        .unwrap();

    assert_eq!(summary.imported, vec!["b".to_string()]);
    assert_eq!(summary.skipped, vec!["a".to_string()]);
    assert_eq!(h.manager.get("a", None).await.unwrap(), json!("keep"));
    assert_eq!(h.manager.get("b", None).await.unwrap(), json!(2));
}

#[tokio::test]
async fn test_import_accepts_loose_metadata_shapes() {
    let h = Harness::new();
    let document = r#"
- key: admin.email
  value: admin@example.com
  group: admin
  label: Administrator email
  validation_rules: "required|email"
- value: no key here
- key: admin.enabled
  value: true
"#;

    let summary = h
        .manager
        .import(document, "yml", &ImportOptions::default())
        .await
        .unwrap();
    assert_eq!(summary.imported, vec!["admin.email".to_string(), "admin.enabled".to_string()]);

    let email = h.manager.find("admin.email").await.unwrap().unwrap();
    assert_eq!(email.validation_rules, Some(vec![json!("required"), json!("email")]));
    assert_eq!(
        h.manager.label("admin.email", None).await.unwrap().as_deref(),
        Some("Administrator email")
    );
    assert_eq!(h.manager.get("admin.enabled", None).await.unwrap(), json!(true));
}

#[tokio::test]
async fn test_import_validates_values() {
    let h = Harness::new();
    let document = r#"[
        {"key": "first", "value": 1},
        {"key": "bad", "value": "nope", "validation_rules": ["email"]},
        {"key": "after", "value": 3}
    ]"#;

    let err = h
        .manager
        .import(document, "json", &ImportOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, SettingsError::Validation { .. }));
    assert!(h.manager.has("first").await.unwrap());
    assert!(!h.manager.has("after").await.unwrap());
}

#[tokio::test]
async fn test_import_rejects_non_list_documents() {
    let h = Harness::new();

    let err = h
        .manager
        .import(r#"{"key": "a", "value": 1}"#, "json", &ImportOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SettingsError::MalformedInput { .. }));

    let err = h
        .manager
        .import("not json at all", "json", &ImportOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, SettingsError::MalformedInput { .. }));
}
