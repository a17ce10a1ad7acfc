//! Import/export wire format
//!
//! A document is a list of records. Each record has at least `key` and
//! `value`; full records add every metadata field plus the stored `type`.

use crate::contract::{Setting, SettingsError, Translations};
use crate::domain::codec;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Supported document encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Yaml,
}

impl ExportFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(SettingsError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// Per-call export options; `None` falls back to configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    pub include_metadata: Option<bool>,
    pub include_encrypted: Option<bool>,
    pub group: Option<String>,
}

/// Per-call import options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Replace keys that already exist
    pub overwrite: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self { overwrite: true }
    }
}

/// What an import run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Keys written, in document order
    pub imported: Vec<String>,
    /// Keys left alone because they already existed
    pub skipped: Vec<String>,
}

/// Exported record carrying every metadata field
#[derive(Debug, Clone, Serialize)]
pub struct FullRecord {
    pub key: String,
    pub value: Value,
    pub group: Option<String>,
    #[serde(rename = "type")]
    pub r#type: String,
    pub encrypted: bool,
    pub label: Option<Translations>,
    pub description: Option<Translations>,
    pub validation_rules: Option<Vec<Value>>,
    pub options: Option<Value>,
    pub input_type: String,
    pub is_public: bool,
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Exported record with just the value
#[derive(Debug, Clone, Serialize)]
pub struct MinimalRecord {
    pub key: String,
    pub value: Value,
    pub group: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ExportRecord {
    Full(FullRecord),
    Minimal(MinimalRecord),
}

impl ExportRecord {
    pub fn from_setting(setting: &Setting, include_metadata: bool) -> Self {
        let value = codec::decode(setting.value.as_deref(), setting.r#type);
        if !include_metadata {
            return Self::Minimal(MinimalRecord {
                key: setting.key.clone(),
                value,
                group: setting.group.clone(),
            });
        }
        Self::Full(FullRecord {
            key: setting.key.clone(),
            value,
            group: setting.group.clone(),
            r#type: setting.r#type.as_str().to_string(),
            encrypted: setting.encrypted,
            label: setting.label.clone(),
            description: setting.description.clone(),
            validation_rules: setting.validation_rules.clone(),
            options: setting.options.clone(),
            input_type: setting.input_type.clone(),
            is_public: setting.is_public,
            order: setting.order,
            created_at: setting.created_at,
            updated_at: setting.updated_at,
        })
    }
}

/// Display text given either as a plain string or per locale
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Localized {
    Text(String),
    PerLocale(Translations),
}

impl Localized {
    /// Plain strings are filed under `locale`
    pub fn into_translations(self, locale: &str) -> Translations {
        match self {
            Self::Text(text) => Translations::from([(locale.to_string(), text)]),
            Self::PerLocale(map) => map,
        }
    }
}

/// Rules given as a list or as a `|`-separated string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RuleList {
    Piped(String),
    List(Vec<Value>),
}

impl RuleList {
    pub fn into_rules(self) -> Vec<Value> {
        match self {
            Self::Piped(rules) => rules
                .split('|')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(|r| Value::String(r.to_string()))
                .collect(),
            Self::List(rules) => rules,
        }
    }
}

/// One record of an import document. Unknown fields (ids, timestamps,
/// `type`) are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRecord {
    pub key: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub encrypted: bool,
    #[serde(default)]
    pub label: Option<Localized>,
    #[serde(default)]
    pub description: Option<Localized>,
    #[serde(default)]
    pub validation_rules: Option<RuleList>,
    #[serde(default)]
    pub options: Option<Value>,
    #[serde(default)]
    pub input_type: Option<String>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub order: Option<i32>,
}

impl ImportRecord {
    /// Whether this record should go through the metadata-aware write
    pub fn has_metadata(&self) -> bool {
        self.label.is_some()
            || self.description.is_some()
            || self.validation_rules.is_some()
            || self.options.is_some()
            || self.input_type.is_some()
            || self.is_public.is_some()
            || self.order.is_some()
    }
}

/// Render records in the requested format
pub fn render(records: &[ExportRecord], format: ExportFormat) -> Result<String, SettingsError> {
    let rendered = match format {
        ExportFormat::Json => serde_json::to_string_pretty(records).map_err(|e| e.to_string()),
        ExportFormat::Yaml => serde_yaml::to_string(records).map_err(|e| e.to_string()),
    };
    rendered.map_err(|e| {
        tracing::error!(error = %e, format = format.as_str(), "failed to render settings export");
        SettingsError::Internal
    })
}

/// Parse a document into records. Entries without a string `key` are
/// dropped; a document that is not a list is rejected.
pub fn parse(data: &str, format: ExportFormat) -> Result<Vec<ImportRecord>, SettingsError> {
    let document: Value = match format {
        ExportFormat::Json => serde_json::from_str(data).map_err(|e| malformed(e.to_string()))?,
        ExportFormat::Yaml => serde_yaml::from_str(data).map_err(|e| malformed(e.to_string()))?,
    };

    let Value::Array(items) = document else {
        return Err(malformed("expected a list of setting records"));
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        let has_key = item.get("key").is_some_and(Value::is_string);
        if !has_key {
            continue;
        }
        let record: ImportRecord = serde_json::from_value(item)
            .map_err(|e| malformed(format!("invalid setting record: {}", e)))?;
        records.push(record);
    }
    Ok(records)
}

fn malformed(message: impl Into<String>) -> SettingsError {
    SettingsError::MalformedInput {
        message: message.into(),
    }
}
