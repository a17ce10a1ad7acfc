//! Native client trait for in-process consumers
//!
//! Template renderers and other modules only need read access to settings;
//! this is the surface they depend on. NO HTTP - direct function calls.

use super::error::SettingsError;
use async_trait::async_trait;

/// Read-only settings lookups
#[async_trait]
pub trait SettingsLookup: Send + Sync {
    /// Decoded value for `key`, falling back to configured defaults and then `default`
    async fn get(
        &self,
        key: &str,
        default: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, SettingsError>;

    /// Label in `locale` (or the default locale)
    async fn label(&self, key: &str, locale: Option<&str>) -> Result<Option<String>, SettingsError>;

    /// Description in `locale` (or the default locale)
    async fn description(
        &self,
        key: &str,
        locale: Option<&str>,
    ) -> Result<Option<String>, SettingsError>;
}
