//! Configuration for the settings manager

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Settings manager configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Read-through cache for global settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Fallback locale for label/description/options lookups
    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// History recording for global settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// key -> value returned when a setting is entirely absent
    #[serde(default)]
    pub defaults: HashMap<String, serde_json::Value>,

    /// Secret used for encrypted settings
    #[serde(default)]
    pub encryption: EncryptionConfig,

    /// Export defaults
    #[serde(default)]
    pub import_export: ImportExportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            default_locale: default_locale(),
            audit: AuditConfig::default(),
            defaults: HashMap::new(),
            encryption: EncryptionConfig::default(),
            import_export: ImportExportConfig::default(),
        }
    }
}

impl Config {
    /// Layer defaults, an optional YAML file and `SETTINGS_*` environment
    /// variables (`__` separates nested keys, e.g. `SETTINGS_CACHE__TTL=5m`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed("SETTINGS_").split("__"))
            .extract()?;
        Ok(config)
    }
}

/// Cache driver selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheDriverKind {
    /// Process-local map
    Memory,
    /// Never stores anything
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_cache_driver")]
    pub driver: CacheDriverKind,

    /// Namespace for cache keys
    #[serde(default = "default_cache_prefix")]
    pub prefix: String,

    /// Safety-net expiry; invalidation on write is the primary mechanism
    #[serde(default = "default_cache_ttl", with = "humantime_serde")]
    pub ttl: Duration,

    /// Upper bound on entries held by the memory driver
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            driver: default_cache_driver(),
            prefix: default_cache_prefix(),
            ttl: default_cache_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_true")]
    pub track_ip: bool,

    #[serde(default = "default_true")]
    pub track_user_agent: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            track_ip: true,
            track_user_agent: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EncryptionConfig {
    /// Application-wide secret. When unset a random per-process key is used.
    #[serde(default)]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportExportConfig {
    #[serde(default = "default_true")]
    pub include_metadata: bool,

    #[serde(default)]
    pub include_encrypted: bool,
}

impl Default for ImportExportConfig {
    fn default() -> Self {
        Self {
            include_metadata: true,
            include_encrypted: false,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_cache_driver() -> CacheDriverKind {
    CacheDriverKind::Memory
}

fn default_cache_prefix() -> String {
    "settings".to_string()
}

fn default_cache_ttl() -> Duration {
    Duration::from_secs(3600)
}

pub(crate) fn default_max_entries() -> u64 {
    10_000
}
