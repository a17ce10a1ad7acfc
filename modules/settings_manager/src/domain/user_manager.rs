//! Per-user settings manager
//!
//! Same contract as the global manager scoped to one principal, minus the
//! cache, the history trail and `is_public`. Reads without a principal
//! return the caller's default; writes without one are rejected.

use super::codec;
use super::manager::{storage_failure, BulkValue, SettingDefinition, ValueCodec};
use super::repository::{SettingChange, UserSettingsRepository};
use crate::contract::{Principal, SettingsError, UserSetting};
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct UserSettingsManager {
    repo: Arc<dyn UserSettingsRepository>,
    codec: ValueCodec,
    principal: Option<Principal>,
}

impl UserSettingsManager {
    pub(crate) fn new(
        repo: Arc<dyn UserSettingsRepository>,
        codec: ValueCodec,
        principal: Option<Principal>,
    ) -> Self {
        Self {
            repo,
            codec,
            principal,
        }
    }

    pub fn principal(&self) -> Option<Principal> {
        self.principal
    }

    /// Same stores, different principal
    pub fn for_user(&self, principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            ..self.clone()
        }
    }

    fn require_user(&self) -> Result<Uuid, SettingsError> {
        self.principal
            .map(|p| p.id)
            .ok_or(SettingsError::Unauthenticated)
    }

    // ===== Reads =====

    pub async fn get(&self, key: &str, default: Option<Value>) -> Result<Value, SettingsError> {
        let default = default.unwrap_or(Value::Null);
        Ok(self
            .find(key)
            .await?
            .map(|s| codec::decode(s.value.as_deref(), s.r#type))
            .unwrap_or(default))
    }

    pub async fn encrypted(&self, key: &str, default: Option<Value>) -> Result<Value, SettingsError> {
        let default = default.unwrap_or(Value::Null);
        match self.find(key).await? {
            Some(setting) if setting.encrypted => Ok(self
                .codec
                .open(key, setting.value.as_deref())
                .unwrap_or(default)),
            _ => Ok(default),
        }
    }

    pub async fn has(&self, key: &str) -> Result<bool, SettingsError> {
        let Some(principal) = self.principal else {
            return Ok(false);
        };
        self.repo
            .exists(principal.id, key)
            .await
            .map_err(storage_failure("user_exists", key))
    }

    /// Full entity for `key`; `None` without a principal
    pub async fn find(&self, key: &str) -> Result<Option<UserSetting>, SettingsError> {
        let Some(principal) = self.principal else {
            return Ok(None);
        };
        self.repo
            .find_by_key(principal.id, key)
            .await
            .map_err(storage_failure("user_find", key))
    }

    pub async fn all(&self) -> Result<IndexMap<String, Value>, SettingsError> {
        Ok(self
            .all_with_metadata()
            .await?
            .iter()
            .map(|s| (s.key.clone(), codec::decode(s.value.as_deref(), s.r#type)))
            .collect())
    }

    /// Full entities ordered by `order`
    pub async fn all_with_metadata(&self) -> Result<Vec<UserSetting>, SettingsError> {
        let Some(principal) = self.principal else {
            return Ok(Vec::new());
        };
        self.repo
            .list(principal.id)
            .await
            .map_err(storage_failure("user_list", "*"))
    }

    pub async fn label(&self, key: &str, locale: Option<&str>) -> Result<Option<String>, SettingsError> {
        let setting = self.find(key).await?;
        Ok(setting.and_then(|s| self.codec.translate(s.label.as_ref(), locale)))
    }

    pub async fn description(&self, key: &str, locale: Option<&str>) -> Result<Option<String>, SettingsError> {
        let setting = self.find(key).await?;
        Ok(setting.and_then(|s| self.codec.translate(s.description.as_ref(), locale)))
    }

    // ===== Writes =====

    pub async fn set(&self, key: &str, value: Value, group: Option<&str>) -> Result<UserSetting, SettingsError> {
        self.write(key, value, group.map(str::to_string), false).await
    }

    pub async fn set_encrypted(
        &self,
        key: &str,
        value: Value,
        group: Option<&str>,
    ) -> Result<UserSetting, SettingsError> {
        self.write(key, value, group.map(str::to_string), true).await
    }

    /// Metadata-aware write; `is_public` on the definition is ignored
    pub async fn set_with_metadata(&self, definition: SettingDefinition) -> Result<UserSetting, SettingsError> {
        let user_id = self.require_user()?;
        if !definition.encrypted {
            self.codec
                .check(&definition.value, definition.validation_rules.as_deref())?;
        }
        let stored = self
            .codec
            .store(&definition.key, &definition.value, definition.encrypted)?;
        let mut metadata = definition.metadata();
        metadata.is_public = false;
        let change = SettingChange {
            key: definition.key.clone(),
            value: stored.text,
            r#type: stored.r#type,
            encrypted: definition.encrypted,
            group: definition.group.clone(),
            metadata: Some(metadata),
        };
        self.upsert(user_id, change).await
    }

    pub async fn forget(&self, key: &str) -> Result<bool, SettingsError> {
        let user_id = self.require_user()?;
        let removed = self
            .repo
            .delete(user_id, key)
            .await
            .map_err(storage_failure("user_delete", key))?;
        Ok(removed.is_some())
    }

    /// Delete every setting of the principal, returning how many went
    pub async fn flush(&self) -> Result<u64, SettingsError> {
        let user_id = self.require_user()?;
        let removed = self
            .repo
            .delete_all(user_id)
            .await
            .map_err(storage_failure("user_flush", "*"))?;
        tracing::info!(%user_id, removed, "flushed user settings");
        Ok(removed)
    }

    // ===== Bulk =====

    pub async fn set_bulk(
        &self,
        items: IndexMap<String, BulkValue>,
    ) -> Result<IndexMap<String, UserSetting>, SettingsError> {
        let mut results = IndexMap::with_capacity(items.len());
        for (key, item) in items {
            let setting = self.write(&key, item.value, item.group, item.encrypted).await?;
            results.insert(key, setting);
        }
        Ok(results)
    }

    pub async fn get_bulk(
        &self,
        keys: &[&str],
        default: Option<Value>,
    ) -> Result<IndexMap<String, Value>, SettingsError> {
        let mut results = IndexMap::with_capacity(keys.len());
        for key in keys {
            results.insert((*key).to_string(), self.get(key, default.clone()).await?);
        }
        Ok(results)
    }

    /// True only when every key was removed
    pub async fn forget_bulk(&self, keys: &[&str]) -> Result<bool, SettingsError> {
        let mut all_removed = true;
        for key in keys {
            all_removed &= self.forget(key).await?;
        }
        Ok(all_removed)
    }

    pub async fn set_with_metadata_bulk(
        &self,
        definitions: Vec<SettingDefinition>,
    ) -> Result<IndexMap<String, UserSetting>, SettingsError> {
        let mut results = IndexMap::with_capacity(definitions.len());
        for definition in definitions {
            let key = definition.key.clone();
            results.insert(key, self.set_with_metadata(definition).await?);
        }
        Ok(results)
    }

    // ===== Internals =====

    async fn write(
        &self,
        key: &str,
        value: Value,
        group: Option<String>,
        encrypted: bool,
    ) -> Result<UserSetting, SettingsError> {
        let user_id = self.require_user()?;
        if !encrypted {
            if let Some(existing) = self.find(key).await? {
                self.codec
                    .check(&value, existing.validation_rules.as_deref())?;
            }
        }

        let stored = self.codec.store(key, &value, encrypted)?;
        let change = SettingChange {
            key: key.to_string(),
            value: stored.text,
            r#type: stored.r#type,
            encrypted,
            group,
            metadata: None,
        };
        self.upsert(user_id, change).await
    }

    async fn upsert(&self, user_id: Uuid, change: SettingChange) -> Result<UserSetting, SettingsError> {
        let upserted = self
            .repo
            .upsert(user_id, &change)
            .await
            .map_err(storage_failure("user_upsert", &change.key))?;
        tracing::debug!(key = %change.key, %user_id, created = upserted.was_created(), "user setting written");
        Ok(upserted.current)
    }
}
