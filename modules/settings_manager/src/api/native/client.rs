//! Native client implementation - wraps the settings manager for in-process calls

use crate::contract::{SettingsError, SettingsLookup};
use crate::domain::SettingsManager;
use async_trait::async_trait;

/// Read-only client that calls the settings manager directly
///
/// Template renderers and other in-process consumers depend on
/// [`SettingsLookup`] rather than on the manager itself.
#[derive(Clone)]
pub struct NativeClient {
    manager: SettingsManager,
}

impl NativeClient {
    /// Create a new native client
    pub fn new(manager: SettingsManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl SettingsLookup for NativeClient {
    async fn get(
        &self,
        key: &str,
        default: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, SettingsError> {
        self.manager.get(key, default).await
    }

    async fn label(&self, key: &str, locale: Option<&str>) -> Result<Option<String>, SettingsError> {
        self.manager.label(key, locale).await
    }

    async fn description(
        &self,
        key: &str,
        locale: Option<&str>,
    ) -> Result<Option<String>, SettingsError> {
        self.manager.description(key, locale).await
    }
}
