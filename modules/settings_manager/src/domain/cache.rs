//! Read-through cache for global settings
//!
//! Two independent entries exist per key: the decoded value and the result
//! of the existence check. Writes and deletes evict both. The TTL is only a
//! safety net; correctness comes from eviction on write.

use crate::config::{default_max_entries, CacheConfig, CacheDriverKind};
use crate::contract::SettingsError;
use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Backing store for cache entries
///
/// Implementations may be process-local or shared; invalidation must reach
/// the same instance the read path uses.
#[async_trait]
pub trait CacheDriver: Send + Sync {
    async fn get(&self, key: &str) -> Option<Value>;
    async fn put(&self, key: &str, value: Value, ttl: Duration);
    async fn forget(&self, key: &str);
    async fn flush(&self);
}

/// Entry held by [`MemoryCacheDriver`]: the value and its own TTL
#[derive(Clone)]
struct Entry {
    value: Value,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with
struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Process-local cache driver backed by `moka`
///
/// Expired entries are reclaimed by moka's housekeeping, and the entry count
/// is bounded by `max_entries`.
pub struct MemoryCacheDriver {
    entries: Cache<String, Entry>,
}

impl MemoryCacheDriver {
    pub fn new() -> Self {
        Self::with_capacity(default_max_entries())
    }

    pub fn with_capacity(max_entries: u64) -> Self {
        let entries = Cache::builder()
            .name("settings")
            .max_capacity(max_entries)
            .expire_after(EntryTtl)
            .build();
        Self { entries }
    }

    /// Whether a live entry exists for a fully-qualified cache key
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Live entries after pending evictions have been applied
    pub async fn entry_count(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.entry_count().await == 0
    }
}

impl Default for MemoryCacheDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheDriver for MemoryCacheDriver {
    async fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).await.map(|entry| entry.value)
    }

    async fn put(&self, key: &str, value: Value, ttl: Duration) {
        self.entries
            .insert(key.to_string(), Entry { value, ttl })
            .await;
    }

    async fn forget(&self, key: &str) {
        self.entries.invalidate(key).await;
    }

    async fn flush(&self) {
        let keys: Vec<Arc<String>> = self.entries.iter().map(|(key, _)| key).collect();
        for key in keys {
            self.entries.invalidate(key.as_str()).await;
        }
        self.entries.run_pending_tasks().await;
    }
}

/// Driver that never stores anything
pub struct NullCacheDriver;

#[async_trait]
impl CacheDriver for NullCacheDriver {
    async fn get(&self, _key: &str) -> Option<Value> {
        None
    }

    async fn put(&self, _key: &str, _value: Value, _ttl: Duration) {}

    async fn forget(&self, _key: &str) {}

    async fn flush(&self) {}
}

/// Build the driver named in configuration
pub fn driver_for(config: &CacheConfig) -> Arc<dyn CacheDriver> {
    match config.driver {
        CacheDriverKind::Memory => Arc::new(MemoryCacheDriver::with_capacity(config.max_entries)),
        CacheDriverKind::None => Arc::new(NullCacheDriver),
    }
}

/// Cache-aside layer keyed by setting key
#[derive(Clone)]
pub struct SettingsCache {
    driver: Arc<dyn CacheDriver>,
    enabled: bool,
    prefix: String,
    ttl: Duration,
}

impl SettingsCache {
    pub fn new(driver: Arc<dyn CacheDriver>, config: &CacheConfig) -> Self {
        Self {
            driver,
            enabled: config.enabled,
            prefix: config.prefix.clone(),
            ttl: config.ttl,
        }
    }

    /// Cache that always calls through to the loader
    pub fn disabled() -> Self {
        Self {
            driver: Arc::new(NullCacheDriver),
            enabled: false,
            prefix: String::new(),
            ttl: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Driver key holding the decoded value of `key`
    pub fn value_key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    /// Driver key holding the existence flag of `key`
    pub fn exists_key(&self, key: &str) -> String {
        format!("{}:exists:{}", self.prefix, key)
    }

    /// Return the cached value or run `loader`. `Ok(None)` from the loader
    /// means "nothing to cache" and is passed through untouched.
    pub async fn read<F, Fut>(&self, key: &str, loader: F) -> Result<Option<Value>, SettingsError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<Option<Value>, SettingsError>> + Send,
    {
        if !self.enabled {
            return loader().await;
        }

        let cache_key = self.value_key(key);
        if let Some(hit) = self.driver.get(&cache_key).await {
            tracing::debug!(key, "settings cache hit");
            return Ok(Some(hit));
        }

        tracing::debug!(key, "settings cache miss");
        let loaded = loader().await?;
        if let Some(value) = &loaded {
            self.driver.put(&cache_key, value.clone(), self.ttl).await;
        }
        Ok(loaded)
    }

    /// Cached existence check
    pub async fn read_exists<F, Fut>(&self, key: &str, loader: F) -> Result<bool, SettingsError>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<bool, SettingsError>> + Send,
    {
        if !self.enabled {
            return loader().await;
        }

        let cache_key = self.exists_key(key);
        if let Some(Value::Bool(hit)) = self.driver.get(&cache_key).await {
            return Ok(hit);
        }

        let exists = loader().await?;
        self.driver
            .put(&cache_key, Value::Bool(exists), self.ttl)
            .await;
        Ok(exists)
    }

    /// Evict the value entry of `key`
    pub async fn invalidate(&self, key: &str) {
        if self.enabled {
            self.driver.forget(&self.value_key(key)).await;
        }
    }

    /// Evict the existence entry of `key`
    pub async fn invalidate_existence(&self, key: &str) {
        if self.enabled {
            self.driver.forget(&self.exists_key(key)).await;
        }
    }

    /// Drop every entry in the driver
    pub async fn flush_all(&self) {
        if self.enabled {
            self.driver.flush().await;
        }
    }
}
