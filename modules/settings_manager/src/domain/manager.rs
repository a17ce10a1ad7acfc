//! Settings manager - orchestrates store, cache, codec, audit and validation
//!
//! Every successful write runs the same visible sequence: upsert, history
//! record, cache eviction of both per-key entries, event publish. History
//! and publish failures are logged; eviction always runs.

use super::audit::{Change, HistoryRecorder};
use super::cache::{self, CacheDriver, SettingsCache};
use super::codec::{self, StoredValue};
use super::crypto::Encrypter;
use super::events::{EventPublisher, NoOpEventPublisher, SettingEvent};
use super::repository::{
    HistoryRepository, SettingChange, SettingFilter, SettingMetadata, SettingsRepository,
    UserSettingsRepository,
};
use super::transfer::{self, ExportFormat, ExportOptions, ExportRecord, ImportOptions, ImportSummary};
use super::user_manager::UserSettingsManager;
use super::validation::{RuleValidator, ValueValidator};
use crate::config::{Config, ImportExportConfig};
use crate::contract::{
    ActorContext, HistoryAction, Principal, Setting, SettingHistory, SettingsError, Translations,
};
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Full description of a setting for the metadata-aware write
///
/// Omitted optional fields are written as their defaults (`input_type`
/// "text", not public, order 0), never left at their previous value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SettingDefinition {
    pub key: String,
    pub value: Value,
    pub group: Option<String>,
    pub label: Option<Translations>,
    pub description: Option<Translations>,
    pub validation_rules: Option<Vec<Value>>,
    pub options: Option<Value>,
    pub input_type: Option<String>,
    pub is_public: Option<bool>,
    pub order: Option<i32>,
    pub encrypted: bool,
}

impl SettingDefinition {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn label(mut self, label: Translations) -> Self {
        self.label = Some(label);
        self
    }

    pub fn description(mut self, description: Translations) -> Self {
        self.description = Some(description);
        self
    }

    pub fn rules(mut self, rules: Vec<Value>) -> Self {
        self.validation_rules = Some(rules);
        self
    }

    pub fn options(mut self, options: Value) -> Self {
        self.options = Some(options);
        self
    }

    pub fn input_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = Some(input_type.into());
        self
    }

    pub fn public(mut self, is_public: bool) -> Self {
        self.is_public = Some(is_public);
        self
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn encrypted(mut self, encrypted: bool) -> Self {
        self.encrypted = encrypted;
        self
    }

    pub(crate) fn metadata(&self) -> SettingMetadata {
        SettingMetadata {
            label: self.label.clone(),
            description: self.description.clone(),
            validation_rules: self.validation_rules.clone(),
            options: self.options.clone(),
            input_type: self
                .input_type
                .clone()
                .unwrap_or_else(|| "text".to_string()),
            is_public: self.is_public.unwrap_or(false),
            order: self.order.unwrap_or(0),
        }
    }
}

/// One entry of a bulk write
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BulkValue {
    pub value: Value,
    pub group: Option<String>,
    pub encrypted: bool,
}

impl From<Value> for BulkValue {
    fn from(value: Value) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }
}

/// Pieces shared by the global and the per-user manager
#[derive(Clone)]
pub(crate) struct ValueCodec {
    pub encrypter: Encrypter,
    pub validator: Arc<dyn ValueValidator>,
    pub default_locale: String,
}

impl ValueCodec {
    /// Encode `value`, sealing its text form when `encrypted`
    pub fn store(&self, key: &str, value: &Value, encrypted: bool) -> Result<StoredValue, SettingsError> {
        if !encrypted {
            return Ok(codec::encode(value));
        }
        let sealed = self.encrypter.encrypt(&codec::plain_text(value)).map_err(|e| {
            tracing::error!(key, error = %e, "failed to encrypt setting value");
            SettingsError::Internal
        })?;
        Ok(StoredValue {
            text: Some(sealed),
            r#type: crate::contract::SettingType::String,
        })
    }

    /// Plaintext of an encrypted entry, or `None` when it does not decrypt
    pub fn open(&self, key: &str, stored: Option<&str>) -> Option<Value> {
        let stored = stored?;
        match self.encrypter.decrypt(stored) {
            Ok(plain) => Some(Value::String(plain)),
            Err(e) => {
                tracing::warn!(key, error = %e, "encrypted setting did not decrypt");
                None
            }
        }
    }

    pub fn check(&self, value: &Value, rules: Option<&[Value]>) -> Result<(), SettingsError> {
        let Some(rules) = rules.filter(|r| !r.is_empty()) else {
            return Ok(());
        };
        let messages = self.validator.validate(value, rules);
        if messages.is_empty() {
            Ok(())
        } else {
            Err(SettingsError::value_validation(messages))
        }
    }

    pub fn translate(&self, map: Option<&Translations>, locale: Option<&str>) -> Option<String> {
        let map = map?;
        let locale = locale.unwrap_or(&self.default_locale);
        map.get(locale)
            .or_else(|| map.get(&self.default_locale))
            .cloned()
    }

    /// Locale entry of a locale-keyed options map; flat lists and plain
    /// choice maps come back unchanged
    pub fn localized_options(&self, options: Option<&Value>, locale: Option<&str>) -> Option<Value> {
        let options = options?;
        let Value::Object(map) = options else {
            return Some(options.clone());
        };
        let locale = locale.unwrap_or(&self.default_locale);
        if map.contains_key(locale) || map.contains_key(&self.default_locale) {
            return map
                .get(locale)
                .or_else(|| map.get(&self.default_locale))
                .cloned();
        }
        Some(options.clone())
    }
}

/// Wrap a storage failure into `Internal` after logging it
pub(crate) fn storage_failure<'a>(
    operation: &'static str,
    key: &'a str,
) -> impl FnOnce(anyhow::Error) -> SettingsError + 'a {
    move |e| {
        tracing::error!(operation, key, error = %e, "settings storage failure");
        SettingsError::Internal
    }
}

/// Decoded stored value of a setting; encrypted entries stay encrypted
pub fn decoded_value(setting: &Setting) -> Value {
    codec::decode(setting.value.as_deref(), setting.r#type)
}

/// Manager for global settings
#[derive(Clone)]
pub struct SettingsManager {
    settings: Arc<dyn SettingsRepository>,
    user_settings: Arc<dyn UserSettingsRepository>,
    history: Arc<dyn HistoryRepository>,
    recorder: HistoryRecorder,
    cache: SettingsCache,
    codec: ValueCodec,
    events: Arc<dyn EventPublisher>,
    defaults: Arc<HashMap<String, Value>>,
    transfer: ImportExportConfig,
    actor: ActorContext,
}

impl SettingsManager {
    /// Build a manager from its stores and configuration
    pub fn new(
        settings: Arc<dyn SettingsRepository>,
        user_settings: Arc<dyn UserSettingsRepository>,
        history: Arc<dyn HistoryRepository>,
        config: &Config,
    ) -> Self {
        let encrypter = match config.encryption.key.as_deref() {
            Some(secret) if !secret.is_empty() => Encrypter::from_secret(secret),
            _ => {
                tracing::warn!("no encryption key configured; encrypted settings will not survive a restart");
                Encrypter::ephemeral()
            }
        };

        Self {
            settings,
            user_settings,
            recorder: HistoryRecorder::new(history.clone(), config.audit.clone()),
            history,
            cache: SettingsCache::new(cache::driver_for(&config.cache), &config.cache),
            codec: ValueCodec {
                encrypter,
                validator: Arc::new(RuleValidator),
                default_locale: config.default_locale.clone(),
            },
            events: Arc::new(NoOpEventPublisher),
            defaults: Arc::new(config.defaults.clone()),
            transfer: config.import_export.clone(),
            actor: ActorContext::anonymous(),
        }
    }

    /// Use a shared cache driver instead of the configured one
    pub fn with_cache(mut self, driver: Arc<dyn CacheDriver>, config: &crate::config::CacheConfig) -> Self {
        self.cache = SettingsCache::new(driver, config);
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn ValueValidator>) -> Self {
        self.codec.validator = validator;
        self
    }

    pub fn with_event_publisher(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = events;
        self
    }

    pub fn with_encrypter(mut self, encrypter: Encrypter) -> Self {
        self.codec.encrypter = encrypter;
        self
    }

    /// Copy of this manager that attributes history records to `actor`
    pub fn with_actor(&self, actor: ActorContext) -> Self {
        Self {
            actor,
            ..self.clone()
        }
    }

    pub fn actor(&self) -> &ActorContext {
        &self.actor
    }

    /// Manager for the settings of one principal. `None` gives a manager
    /// whose reads return defaults and whose writes are rejected.
    pub fn user(&self, principal: impl Into<Option<Principal>>) -> UserSettingsManager {
        UserSettingsManager::new(
            self.user_settings.clone(),
            self.codec.clone(),
            principal.into(),
        )
    }

    // ===== Reads =====

    /// Decoded value of `key`, falling back to the configured defaults map
    /// and then to `default`. Encrypted entries are returned as stored.
    pub async fn get(&self, key: &str, default: Option<Value>) -> Result<Value, SettingsError> {
        let found = self.cache.read(key, || self.load_value(key)).await?;
        Ok(found.unwrap_or_else(|| self.fallback(key, default)))
    }

    /// Plaintext of an encrypted entry; `default` when the entry is absent,
    /// not encrypted, or does not decrypt
    pub async fn encrypted(&self, key: &str, default: Option<Value>) -> Result<Value, SettingsError> {
        let default = default.unwrap_or(Value::Null);
        let Some(setting) = self.find(key).await? else {
            return Ok(default);
        };
        if !setting.encrypted {
            return Ok(default);
        }
        Ok(self
            .codec
            .open(key, setting.value.as_deref())
            .unwrap_or(default))
    }

    pub async fn has(&self, key: &str) -> Result<bool, SettingsError> {
        self.cache
            .read_exists(key, || async {
                self.settings
                    .exists(key)
                    .await
                    .map_err(storage_failure("exists", key))
            })
            .await
    }

    /// Full entity for `key`, bypassing the cache
    pub async fn find(&self, key: &str) -> Result<Option<Setting>, SettingsError> {
        self.settings
            .find_by_key(key)
            .await
            .map_err(storage_failure("find", key))
    }

    /// key -> decoded value for every setting, optionally within one group
    pub async fn all(&self, group: Option<&str>) -> Result<IndexMap<String, Value>, SettingsError> {
        self.values(&SettingFilter::group(group)).await
    }

    pub async fn group(&self, group: &str) -> Result<IndexMap<String, Value>, SettingsError> {
        self.all(Some(group)).await
    }

    /// Like [`Self::all`] restricted to public settings
    pub async fn all_public(&self, group: Option<&str>) -> Result<IndexMap<String, Value>, SettingsError> {
        let filter = SettingFilter {
            public_only: true,
            ..SettingFilter::group(group)
        };
        self.values(&filter).await
    }

    /// Full entities ordered by `order`
    pub async fn all_with_metadata(&self, group: Option<&str>) -> Result<Vec<Setting>, SettingsError> {
        self.list(&SettingFilter::group(group)).await
    }

    pub async fn label(&self, key: &str, locale: Option<&str>) -> Result<Option<String>, SettingsError> {
        let setting = self.find(key).await?;
        Ok(setting.and_then(|s| self.codec.translate(s.label.as_ref(), locale)))
    }

    pub async fn description(&self, key: &str, locale: Option<&str>) -> Result<Option<String>, SettingsError> {
        let setting = self.find(key).await?;
        Ok(setting.and_then(|s| self.codec.translate(s.description.as_ref(), locale)))
    }

    pub async fn options(&self, key: &str, locale: Option<&str>) -> Result<Option<Value>, SettingsError> {
        let setting = self.find(key).await?;
        Ok(setting.and_then(|s| self.codec.localized_options(s.options.as_ref(), locale)))
    }

    // ===== Writes =====

    /// Store `value` under `key`. An existing entry's rules are checked
    /// first; a failing value leaves the store untouched.
    pub async fn set(&self, key: &str, value: Value, group: Option<&str>) -> Result<Setting, SettingsError> {
        self.write(key, value, group.map(str::to_string), false).await
    }

    /// Store `value` encrypted. Validation is skipped and the type tag is
    /// forced to `string`.
    pub async fn set_encrypted(&self, key: &str, value: Value, group: Option<&str>) -> Result<Setting, SettingsError> {
        self.write(key, value, group.map(str::to_string), true).await
    }

    /// Store a value together with its full metadata, validating against
    /// the supplied rules
    pub async fn set_with_metadata(&self, definition: SettingDefinition) -> Result<Setting, SettingsError> {
        if !definition.encrypted {
            self.codec
                .check(&definition.value, definition.validation_rules.as_deref())?;
        }
        let stored = self
            .codec
            .store(&definition.key, &definition.value, definition.encrypted)?;
        let change = SettingChange {
            key: definition.key.clone(),
            value: stored.text,
            r#type: stored.r#type,
            encrypted: definition.encrypted,
            group: definition.group.clone(),
            metadata: Some(definition.metadata()),
        };
        self.commit(change, true).await
    }

    /// Delete `key`; returns whether a row was removed
    pub async fn forget(&self, key: &str) -> Result<bool, SettingsError> {
        let removed = self
            .settings
            .delete(key)
            .await
            .map_err(storage_failure("delete", key))?;

        if let Some(old) = &removed {
            self.recorder
                .record(
                    Change {
                        key,
                        old_value: old.value.as_deref(),
                        new_value: None,
                        old_type: Some(old.r#type),
                        new_type: None,
                        action: HistoryAction::Deleted,
                    },
                    &self.actor,
                )
                .await;
        }
        self.invalidate(key).await;
        if removed.is_some() {
            self.publish(SettingEvent::deleted(key, self.actor.user_id)).await;
        }
        Ok(removed.is_some())
    }

    /// Drop every cache entry
    pub async fn flush(&self) {
        self.cache.flush_all().await;
        tracing::info!("settings cache flushed");
    }

    // ===== Bulk =====
    //
    // Items are applied one at a time; the first failure stops the batch
    // and earlier items stay committed.

    pub async fn set_bulk(
        &self,
        items: IndexMap<String, BulkValue>,
    ) -> Result<IndexMap<String, Setting>, SettingsError> {
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
            let value = self.get(key, default.clone()).await?;
            results.insert((*key).to_string(), value);
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
    ) -> Result<IndexMap<String, Setting>, SettingsError> {
        let mut results = IndexMap::with_capacity(definitions.len());
        for definition in definitions {
            let key = definition.key.clone();
            let setting = self.set_with_metadata(definition).await?;
            results.insert(key, setting);
        }
        Ok(results)
    }

    // ===== Import / export =====

    /// Serialize settings as `json` or `yaml`
    pub async fn export(&self, format: &str, options: &ExportOptions) -> Result<String, SettingsError> {
        let format: ExportFormat = format.parse()?;
        let include_metadata = options
            .include_metadata
            .unwrap_or(self.transfer.include_metadata);
        let include_encrypted = options
            .include_encrypted
            .unwrap_or(self.transfer.include_encrypted);

        let filter = SettingFilter {
            group: options.group.clone(),
            public_only: false,
            exclude_encrypted: !include_encrypted,
        };
        let records: Vec<ExportRecord> = self
            .list(&filter)
            .await?
            .iter()
            .map(|s| ExportRecord::from_setting(s, include_metadata))
            .collect();

        tracing::info!(format = format.as_str(), count = records.len(), "exporting settings");
        transfer::render(&records, format)
    }

    /// Load records from a `json` or `yaml` document
    pub async fn import(
        &self,
        data: &str,
        format: &str,
        options: &ImportOptions,
    ) -> Result<ImportSummary, SettingsError> {
        let format: ExportFormat = format.parse()?;
        let records = transfer::parse(data, format)?;
        let mut summary = ImportSummary::default();

        for record in records {
            if !options.overwrite {
                let exists = self
                    .settings
                    .exists(&record.key)
                    .await
                    .map_err(storage_failure("exists", &record.key))?;
                if exists {
                    summary.skipped.push(record.key);
                    continue;
                }
            }

            let value = match (&record.value, record.encrypted) {
                (Value::String(text), true) => Value::String(self.codec.encrypter.decrypt_or_raw(text)),
                _ => record.value.clone(),
            };

            if record.has_metadata() {
                let locale = self.codec.default_locale.clone();
                let definition = SettingDefinition {
                    key: record.key.clone(),
                    value,
                    group: record.group,
                    label: record.label.map(|l| l.into_translations(&locale)),
                    description: record.description.map(|d| d.into_translations(&locale)),
                    validation_rules: record.validation_rules.map(|r| r.into_rules()),
                    options: record.options,
                    input_type: record.input_type,
                    is_public: record.is_public,
                    order: record.order,
                    encrypted: record.encrypted,
                };
                self.set_with_metadata(definition).await?;
            } else {
                self.write(&record.key, value, record.group, record.encrypted)
                    .await?;
            }
            summary.imported.push(record.key);
        }

        tracing::info!(
            imported = summary.imported.len(),
            skipped = summary.skipped.len(),
            "imported settings"
        );
        Ok(summary)
    }

    // ===== History =====

    /// Most recent first
    pub async fn get_history(&self, key: &str, limit: u64) -> Result<Vec<SettingHistory>, SettingsError> {
        self.history
            .list_for_key(key, limit)
            .await
            .map_err(storage_failure("history", key))
    }

    /// Most recent first, across all keys
    pub async fn get_all_history(&self, limit: u64) -> Result<Vec<SettingHistory>, SettingsError> {
        self.history
            .list_recent(limit)
            .await
            .map_err(storage_failure("history", "*"))
    }

    /// Write the `old_value` of a history record back as the current value
    /// of `key`, creating the setting when it no longer exists. The restore
    /// itself is not recorded as a new history entry.
    pub async fn restore_to_version(&self, key: &str, history_id: i64) -> Result<Setting, SettingsError> {
        let entry = self
            .history
            .find_by_id(history_id)
            .await
            .map_err(storage_failure("history", key))?
            .ok_or_else(|| SettingsError::NotFound {
                resource: "setting_history".to_string(),
                id: history_id.to_string(),
            })?;

        if entry.setting_key != key {
            return Err(SettingsError::IdentityMismatch {
                key: key.to_string(),
                history_key: entry.setting_key,
            });
        }

        let value = super::audit::old_value(&entry);
        let encrypted = self.find(key).await?.is_some_and(|s| s.encrypted);
        let stored = codec::encode(&value);
        let change = SettingChange {
            key: key.to_string(),
            value: stored.text,
            r#type: stored.r#type,
            encrypted,
            group: None,
            metadata: None,
        };

        tracing::info!(key, history_id, "restoring setting from history");
        self.commit(change, false).await
    }

    // ===== Internals =====

    async fn load_value(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        tracing::debug!(key, "loading setting from store");
        Ok(self.find(key).await?.as_ref().map(decoded_value))
    }

    fn fallback(&self, key: &str, default: Option<Value>) -> Value {
        self.defaults
            .get(key)
            .cloned()
            .or(default)
            .unwrap_or(Value::Null)
    }

    async fn list(&self, filter: &SettingFilter) -> Result<Vec<Setting>, SettingsError> {
        self.settings
            .list(filter)
            .await
            .map_err(storage_failure("list", filter.group.as_deref().unwrap_or("*")))
    }

    async fn values(&self, filter: &SettingFilter) -> Result<IndexMap<String, Value>, SettingsError> {
        Ok(self
            .list(filter)
            .await?
            .iter()
            .map(|s| (s.key.clone(), decoded_value(s)))
            .collect())
    }

    async fn write(
        &self,
        key: &str,
        value: Value,
        group: Option<String>,
        encrypted: bool,
    ) -> Result<Setting, SettingsError> {
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
        self.commit(change, true).await
    }

    /// Upsert, then history, cache eviction and event publish in that order
    async fn commit(&self, change: SettingChange, record_history: bool) -> Result<Setting, SettingsError> {
        let key = change.key.as_str();
        let upserted = self
            .settings
            .upsert(&change)
            .await
            .map_err(storage_failure("upsert", key))?;
        let created = upserted.was_created();

        if record_history {
            let previous = upserted.previous.as_ref();
            self.recorder
                .record(
                    Change {
                        key,
                        old_value: previous.and_then(|p| p.value.as_deref()),
                        new_value: upserted.current.value.as_deref(),
                        old_type: previous.map(|p| p.r#type),
                        new_type: Some(upserted.current.r#type),
                        action: if created {
                            HistoryAction::Created
                        } else {
                            HistoryAction::Updated
                        },
                    },
                    &self.actor,
                )
                .await;
        }

        self.invalidate(key).await;
        self.publish(SettingEvent::written(
            &upserted.current,
            created,
            self.actor.user_id,
        ))
        .await;

        tracing::debug!(key, created, "setting written");
        Ok(upserted.current)
    }

    async fn invalidate(&self, key: &str) {
        self.cache.invalidate(key).await;
        self.cache.invalidate_existence(key).await;
    }

    async fn publish(&self, event: SettingEvent) {
        let key = event.key().to_string();
        if let Err(e) = self.events.publish(event).await {
            tracing::warn!(key = %key, error = %e, "failed to publish setting event");
        }
    }
}
