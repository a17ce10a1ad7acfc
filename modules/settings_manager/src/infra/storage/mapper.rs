//! Entity to model mappers
//!
//! Conversions between SeaORM entities and contract models

use super::entity::{setting, setting_history, user_setting};
use crate::contract::{HistoryAction, Setting, SettingHistory, SettingType, Translations, UserSetting};
use crate::domain::repository::NewHistory;
use sea_orm::ActiveValue::{NotSet, Set};
use serde_json::Value;

// ===== JSON column helpers =====

fn translations_from_json(json: Option<Value>) -> Option<Translations> {
    match json? {
        Value::Object(map) => Some(
            map.into_iter()
                .filter_map(|(locale, text)| match text {
                    Value::String(text) => Some((locale, text)),
                    Value::Null => None,
                    other => Some((locale, other.to_string())),
                })
                .collect(),
        ),
        Value::Null => None,
        other => {
            tracing::warn!(value = %other, "ignoring non-object translation column");
            None
        }
    }
}

fn translations_to_json(translations: &Option<Translations>) -> Option<Value> {
    translations.as_ref().map(|map| {
        Value::Object(
            map.iter()
                .map(|(locale, text)| (locale.clone(), Value::String(text.clone())))
                .collect(),
        )
    })
}

/// Rule lists are stored as JSON arrays; older rows may hold a `|` string
fn rules_from_json(json: Option<Value>) -> Option<Vec<Value>> {
    match json? {
        Value::Array(rules) => Some(rules),
        Value::String(piped) => Some(
            piped
                .split('|')
                .filter(|r| !r.is_empty())
                .map(|r| Value::String(r.to_string()))
                .collect(),
        ),
        _ => None,
    }
}

fn rules_to_json(rules: &Option<Vec<Value>>) -> Option<Value> {
    rules.as_ref().map(|r| Value::Array(r.clone()))
}

fn non_null(json: Option<Value>) -> Option<Value> {
    json.filter(|v| !v.is_null())
}

// ===== Setting Conversions =====

impl From<setting::Model> for Setting {
    fn from(entity: setting::Model) -> Self {
        Self {
            id: entity.id,
            key: entity.key,
            group: entity.group,
            value: entity.value,
            r#type: SettingType::parse(&entity.r#type),
            encrypted: entity.encrypted,
            label: translations_from_json(entity.label),
            description: translations_from_json(entity.description),
            validation_rules: rules_from_json(entity.validation_rules),
            options: non_null(entity.options),
            input_type: entity.input_type,
            is_public: entity.is_public,
            order: entity.order,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// The id is left unset for `id == 0` so inserts get a generated key
impl From<&Setting> for setting::ActiveModel {
    fn from(model: &Setting) -> Self {
        Self {
            id: if model.id == 0 { NotSet } else { Set(model.id) },
            key: Set(model.key.clone()),
            group: Set(model.group.clone()),
            value: Set(model.value.clone()),
            r#type: Set(model.r#type.as_str().to_string()),
            encrypted: Set(model.encrypted),
            label: Set(translations_to_json(&model.label)),
            description: Set(translations_to_json(&model.description)),
            validation_rules: Set(rules_to_json(&model.validation_rules)),
            options: Set(model.options.clone()),
            input_type: Set(model.input_type.clone()),
            is_public: Set(model.is_public),
            order: Set(model.order),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        }
    }
}

// ===== User Setting Conversions =====

impl From<user_setting::Model> for UserSetting {
    fn from(entity: user_setting::Model) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            key: entity.key,
            group: entity.group,
            value: entity.value,
            r#type: SettingType::parse(&entity.r#type),
            encrypted: entity.encrypted,
            label: translations_from_json(entity.label),
            description: translations_from_json(entity.description),
            validation_rules: rules_from_json(entity.validation_rules),
            options: non_null(entity.options),
            input_type: entity.input_type,
            order: entity.order,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

impl From<&UserSetting> for user_setting::ActiveModel {
    fn from(model: &UserSetting) -> Self {
        Self {
            id: if model.id == 0 { NotSet } else { Set(model.id) },
            user_id: Set(model.user_id),
            key: Set(model.key.clone()),
            group: Set(model.group.clone()),
            value: Set(model.value.clone()),
            r#type: Set(model.r#type.as_str().to_string()),
            encrypted: Set(model.encrypted),
            label: Set(translations_to_json(&model.label)),
            description: Set(translations_to_json(&model.description)),
            validation_rules: Set(rules_to_json(&model.validation_rules)),
            options: Set(model.options.clone()),
            input_type: Set(model.input_type.clone()),
            order: Set(model.order),
            created_at: Set(model.created_at),
            updated_at: Set(model.updated_at),
        }
    }
}

// ===== History Conversions =====

impl TryFrom<setting_history::Model> for SettingHistory {
    type Error = anyhow::Error;

    fn try_from(entity: setting_history::Model) -> Result<Self, Self::Error> {
        let action = HistoryAction::parse(&entity.action)
            .ok_or_else(|| anyhow::anyhow!("unknown history action: {}", entity.action))?;

        Ok(Self {
            id: entity.id,
            setting_key: entity.setting_key,
            old_value: entity.old_value,
            new_value: entity.new_value,
            old_type: entity.old_type.as_deref().map(SettingType::parse),
            new_type: entity.new_type.as_deref().map(SettingType::parse),
            action,
            user_id: entity.user_id,
            ip_address: entity.ip_address,
            user_agent: entity.user_agent,
            created_at: entity.created_at,
        })
    }
}

impl From<&NewHistory> for setting_history::ActiveModel {
    fn from(entry: &NewHistory) -> Self {
        Self {
            id: NotSet,
            setting_key: Set(entry.setting_key.clone()),
            old_value: Set(entry.old_value.clone()),
            new_value: Set(entry.new_value.clone()),
            old_type: Set(entry.old_type.map(|t| t.as_str().to_string())),
            new_type: Set(entry.new_type.map(|t| t.as_str().to_string())),
            action: Set(entry.action.as_str().to_string()),
            user_id: Set(entry.user_id),
            ip_address: Set(entry.ip_address.clone()),
            user_agent: Set(entry.user_agent.clone()),
            created_at: Set(chrono::Utc::now()),
        }
    }
}
