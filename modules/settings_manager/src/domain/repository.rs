//! Repository traits for data access
//!
//! These traits define the interface for data access operations.
//! Implementations are in infra/storage/repositories.rs

use crate::contract::{HistoryAction, Setting, SettingHistory, SettingType, Translations, UserSetting};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Metadata written by the metadata-aware upsert. Every field overwrites.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettingMetadata {
    pub label: Option<Translations>,
    pub description: Option<Translations>,
    pub validation_rules: Option<Vec<serde_json::Value>>,
    pub options: Option<serde_json::Value>,
    pub input_type: String,
    /// Ignored for user settings
    pub is_public: bool,
    pub order: i32,
}

/// One upsert-by-key request
#[derive(Debug, Clone, PartialEq)]
pub struct SettingChange {
    pub key: String,
    pub value: Option<String>,
    pub r#type: SettingType,
    pub encrypted: bool,
    /// Without metadata: only applied when Some. With metadata: always applied.
    pub group: Option<String>,
    pub metadata: Option<SettingMetadata>,
}

/// Result of an upsert: the row as persisted and, for updates, the row before
#[derive(Debug, Clone, PartialEq)]
pub struct Upserted<T> {
    pub current: T,
    pub previous: Option<T>,
}

impl<T> Upserted<T> {
    pub fn was_created(&self) -> bool {
        self.previous.is_none()
    }
}

/// Listing filter for global settings. Results are sorted by `order`, then id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingFilter {
    pub group: Option<String>,
    pub public_only: bool,
    pub exclude_encrypted: bool,
}

impl SettingFilter {
    pub fn group(group: Option<&str>) -> Self {
        Self {
            group: group.map(str::to_string),
            ..Self::default()
        }
    }

    pub fn matches(&self, setting: &Setting) -> bool {
        self.group
            .as_deref()
            .map_or(true, |g| setting.group.as_deref() == Some(g))
            && (!self.public_only || setting.is_public)
            && (!self.exclude_encrypted || !setting.encrypted)
    }
}

/// Row to append to the history collection
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistory {
    pub setting_key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub old_type: Option<SettingType>,
    pub new_type: Option<SettingType>,
    pub action: HistoryAction,
    pub user_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Repository for global settings
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Find a setting by key
    async fn find_by_key(&self, key: &str) -> Result<Option<Setting>>;

    /// Check whether a key exists
    async fn exists(&self, key: &str) -> Result<bool>;

    /// List settings matching a filter, ordered by `order`
    async fn list(&self, filter: &SettingFilter) -> Result<Vec<Setting>>;

    /// Create or update the row for `change.key`
    async fn upsert(&self, change: &SettingChange) -> Result<Upserted<Setting>>;

    /// Delete by key, returning the removed row
    async fn delete(&self, key: &str) -> Result<Option<Setting>>;
}

/// Repository for per-user settings. Every call is scoped by `user_id`.
#[async_trait]
pub trait UserSettingsRepository: Send + Sync {
    async fn find_by_key(&self, user_id: Uuid, key: &str) -> Result<Option<UserSetting>>;

    async fn exists(&self, user_id: Uuid, key: &str) -> Result<bool>;

    /// All settings of a user ordered by `order`
    async fn list(&self, user_id: Uuid) -> Result<Vec<UserSetting>>;

    /// Create or update the row for `(user_id, change.key)`
    async fn upsert(&self, user_id: Uuid, change: &SettingChange) -> Result<Upserted<UserSetting>>;

    async fn delete(&self, user_id: Uuid, key: &str) -> Result<Option<UserSetting>>;

    /// Delete every setting of a user, returning the count
    async fn delete_all(&self, user_id: Uuid) -> Result<u64>;
}

/// Append-only repository for setting history
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn append(&self, entry: &NewHistory) -> Result<SettingHistory>;

    async fn find_by_id(&self, id: i64) -> Result<Option<SettingHistory>>;

    /// Most recent first
    async fn list_for_key(&self, key: &str, limit: u64) -> Result<Vec<SettingHistory>>;

    /// Most recent first
    async fn list_recent(&self, limit: u64) -> Result<Vec<SettingHistory>>;
}

// ===== Upsert helpers shared by repository implementations =====

/// Build a fresh global setting from a change
pub fn new_setting(id: i64, change: &SettingChange, now: DateTime<Utc>) -> Setting {
    let meta = change.metadata.clone().unwrap_or_else(|| SettingMetadata {
        input_type: "text".to_string(),
        ..SettingMetadata::default()
    });
    Setting {
        id,
        key: change.key.clone(),
        group: change.group.clone(),
        value: change.value.clone(),
        r#type: change.r#type,
        encrypted: change.encrypted,
        label: meta.label,
        description: meta.description,
        validation_rules: meta.validation_rules,
        options: meta.options,
        input_type: meta.input_type,
        is_public: meta.is_public,
        order: meta.order,
        created_at: now,
        updated_at: now,
    }
}

/// Mutate an existing global setting in place
pub fn apply_change(setting: &mut Setting, change: &SettingChange, now: DateTime<Utc>) {
    setting.value = change.value.clone();
    setting.r#type = change.r#type;
    setting.encrypted = change.encrypted;
    match &change.metadata {
        Some(meta) => {
            setting.group = change.group.clone();
            setting.label = meta.label.clone();
            setting.description = meta.description.clone();
            setting.validation_rules = meta.validation_rules.clone();
            setting.options = meta.options.clone();
            setting.input_type = meta.input_type.clone();
            setting.is_public = meta.is_public;
            setting.order = meta.order;
        }
        None => {
            if let Some(group) = &change.group {
                setting.group = Some(group.clone());
            }
        }
    }
    setting.updated_at = now;
}

/// Build a fresh user setting from a change
pub fn new_user_setting(
    id: i64,
    user_id: Uuid,
    change: &SettingChange,
    now: DateTime<Utc>,
) -> UserSetting {
    let Setting {
        key,
        group,
        value,
        r#type,
        encrypted,
        label,
        description,
        validation_rules,
        options,
        input_type,
        order,
        ..
    } = new_setting(id, change, now);
    UserSetting {
        id,
        user_id,
        key,
        group,
        value,
        r#type,
        encrypted,
        label,
        description,
        validation_rules,
        options,
        input_type,
        order,
        created_at: now,
        updated_at: now,
    }
}

/// Mutate an existing user setting in place
pub fn apply_user_change(setting: &mut UserSetting, change: &SettingChange, now: DateTime<Utc>) {
    setting.value = change.value.clone();
    setting.r#type = change.r#type;
    setting.encrypted = change.encrypted;
    match &change.metadata {
        Some(meta) => {
            setting.group = change.group.clone();
            setting.label = meta.label.clone();
            setting.description = meta.description.clone();
            setting.validation_rules = meta.validation_rules.clone();
            setting.options = meta.options.clone();
            setting.input_type = meta.input_type.clone();
            setting.order = meta.order;
        }
        None => {
            if let Some(group) = &change.group {
                setting.group = Some(group.clone());
            }
        }
    }
    setting.updated_at = now;
}
