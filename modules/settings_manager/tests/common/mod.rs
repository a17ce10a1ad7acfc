//! Common test utilities: in-memory repositories and a wired manager
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use settings_manager::config::{Config, EncryptionConfig};
use settings_manager::contract::{Setting, SettingHistory, UserSetting};
use settings_manager::domain::repository::{
    apply_change, apply_user_change, new_setting, new_user_setting, HistoryRepository,
    NewHistory, SettingChange, SettingFilter, SettingsRepository, Upserted,
    UserSettingsRepository,
};
use settings_manager::domain::{
    EventPublisher, MemoryCacheDriver, SettingEvent, SettingsManager,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-application-secret";

// ===== Mock repositories =====

#[derive(Default)]
pub struct MockSettingsRepo {
    data: RwLock<HashMap<String, Setting>>,
    next_id: AtomicI64,
    find_calls: AtomicUsize,
    exists_calls: AtomicUsize,
}

impl MockSettingsRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `find_by_key` calls that reached the store
    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn exists_calls(&self) -> usize {
        self.exists_calls.load(Ordering::SeqCst)
    }

    pub fn count(&self) -> usize {
        self.data.read().len()
    }

    /// Raw stored row, bypassing the manager
    pub fn raw(&self, key: &str) -> Option<Setting> {
        self.data.read().get(key).cloned()
    }

    /// Overwrite a stored row directly, bypassing cache invalidation
    pub fn put_raw(&self, setting: Setting) {
        self.data.write().insert(setting.key.clone(), setting);
    }
}

#[async_trait]
impl SettingsRepository for MockSettingsRepo {
    async fn find_by_key(&self, key: &str) -> Result<Option<Setting>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.data.read().get(key).cloned())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.data.read().contains_key(key))
    }

    async fn list(&self, filter: &SettingFilter) -> Result<Vec<Setting>> {
        let mut items: Vec<Setting> = self
            .data
            .read()
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        items.sort_by_key(|s| (s.order, s.id));
        Ok(items)
    }

    async fn upsert(&self, change: &SettingChange) -> Result<Upserted<Setting>> {
        let now = chrono::Utc::now();
        let mut data = self.data.write();
        match data.get_mut(&change.key) {
            Some(existing) => {
                let previous = existing.clone();
                apply_change(existing, change, now);
                Ok(Upserted {
                    current: existing.clone(),
                    previous: Some(previous),
                })
            }
            None => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                let fresh = new_setting(id, change, now);
                data.insert(change.key.clone(), fresh.clone());
                Ok(Upserted {
                    current: fresh,
                    previous: None,
                })
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<Option<Setting>> {
        Ok(self.data.write().remove(key))
    }
}

#[derive(Default)]
pub struct MockUserSettingsRepo {
    data: RwLock<HashMap<(Uuid, String), UserSetting>>,
    next_id: AtomicI64,
}

impl MockUserSettingsRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.data.read().len()
    }

    pub fn raw(&self, user_id: Uuid, key: &str) -> Option<UserSetting> {
        self.data.read().get(&(user_id, key.to_string())).cloned()
    }
}

#[async_trait]
impl UserSettingsRepository for MockUserSettingsRepo {
    async fn find_by_key(&self, user_id: Uuid, key: &str) -> Result<Option<UserSetting>> {
        Ok(self.raw(user_id, key))
    }

    async fn exists(&self, user_id: Uuid, key: &str) -> Result<bool> {
        Ok(self.data.read().contains_key(&(user_id, key.to_string())))
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<UserSetting>> {
        let mut items: Vec<UserSetting> = self
            .data
            .read()
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        items.sort_by_key(|s| (s.order, s.id));
        Ok(items)
    }

    async fn upsert(&self, user_id: Uuid, change: &SettingChange) -> Result<Upserted<UserSetting>> {
        let now = chrono::Utc::now();
        let mut data = self.data.write();
        match data.get_mut(&(user_id, change.key.clone())) {
            Some(existing) => {
                let previous = existing.clone();
                apply_user_change(existing, change, now);
                Ok(Upserted {
                    current: existing.clone(),
                    previous: Some(previous),
                })
            }
            None => {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
                let fresh = new_user_setting(id, user_id, change, now);
                data.insert((user_id, change.key.clone()), fresh.clone());
                Ok(Upserted {
                    current: fresh,
                    previous: None,
                })
            }
        }
    }

    async fn delete(&self, user_id: Uuid, key: &str) -> Result<Option<UserSetting>> {
        Ok(self.data.write().remove(&(user_id, key.to_string())))
    }

    async fn delete_all(&self, user_id: Uuid) -> Result<u64> {
        let mut data = self.data.write();
        let before = data.len();
        data.retain(|(owner, _), _| *owner != user_id);
        Ok((before - data.len()) as u64)
    }
}

#[derive(Default)]
pub struct MockHistoryRepo {
    entries: RwLock<Vec<SettingHistory>>,
    failing: AtomicBool,
}

impl MockHistoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every append fail
    pub fn fail_appends(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.entries.read().len()
    }

    pub fn entries(&self) -> Vec<SettingHistory> {
        self.entries.read().clone()
    }
}

#[async_trait]
impl HistoryRepository for MockHistoryRepo {
    async fn append(&self, entry: &NewHistory) -> Result<SettingHistory> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("history store unavailable"));
        }
        let mut entries = self.entries.write();
        let record = SettingHistory {
            id: entries.len() as i64 + 1,
            setting_key: entry.setting_key.clone(),
            old_value: entry.old_value.clone(),
            new_value: entry.new_value.clone(),
            old_type: entry.old_type,
            new_type: entry.new_type,
            action: entry.action,
            user_id: entry.user_id,
            ip_address: entry.ip_address.clone(),
            user_agent: entry.user_agent.clone(),
            created_at: chrono::Utc::now(),
        };
        entries.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<SettingHistory>> {
        Ok(self.entries.read().iter().find(|e| e.id == id).cloned())
    }

    async fn list_for_key(&self, key: &str, limit: u64) -> Result<Vec<SettingHistory>> {
        Ok(self
            .entries
            .read()
            .iter()
            .rev()
            .filter(|e| e.setting_key == key)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_recent(&self, limit: u64) -> Result<Vec<SettingHistory>> {
        Ok(self
            .entries
            .read()
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

// ===== Event capture =====

#[derive(Default)]
pub struct CapturingPublisher {
    events: Mutex<Vec<SettingEvent>>,
    failing: AtomicBool,
}

impl CapturingPublisher {
    pub fn events(&self) -> Vec<SettingEvent> {
        self.events.lock().clone()
    }

    pub fn fail_publishes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventPublisher for CapturingPublisher {
    async fn publish(&self, event: SettingEvent) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("event bus unavailable"));
        }
        self.events.lock().push(event);
        Ok(())
    }
}

// ===== Harness =====

pub fn test_config() -> Config {
    Config {
        encryption: EncryptionConfig {
            key: Some(TEST_SECRET.to_string()),
        },
        ..Config::default()
    }
}

/// Manager wired to in-memory stores with handles to inspect each of them
pub struct Harness {
    pub manager: SettingsManager,
    pub settings: Arc<MockSettingsRepo>,
    pub users: Arc<MockUserSettingsRepo>,
    pub history: Arc<MockHistoryRepo>,
    pub cache: Arc<MemoryCacheDriver>,
    pub events: Arc<CapturingPublisher>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: Config) -> Self {
        let settings = Arc::new(MockSettingsRepo::new());
        let users = Arc::new(MockUserSettingsRepo::new());
        let history = Arc::new(MockHistoryRepo::new());
        let cache = Arc::new(MemoryCacheDriver::new());
        let events = Arc::new(CapturingPublisher::default());

        let manager = SettingsManager::new(
            settings.clone(),
            users.clone(),
            history.clone(),
            &config,
        )
        .with_cache(cache.clone(), &config.cache)
        .with_event_publisher(events.clone());

        Self {
            manager,
            settings,
            users,
            history,
            cache,
            events,
        }
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
