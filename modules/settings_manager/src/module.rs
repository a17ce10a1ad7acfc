//! Module declaration and lifecycle: migrations, manager wiring, REST routes

use crate::api::native::NativeClient;
use crate::config::Config;
use crate::contract::SettingsLookup;
use crate::domain::{EventPublisher, SettingsManager};
use crate::infra::storage::{
    Migrator, SeaOrmHistoryRepository, SeaOrmSettingsRepository, SeaOrmUserSettingsRepository,
};
use anyhow::Result;
use parking_lot::RwLock;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;

/// Settings manager module
pub struct SettingsModule {
    config: RwLock<Config>,
    manager: RwLock<Option<SettingsManager>>,
}

impl Default for SettingsModule {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl SettingsModule {
    pub fn new(config: Config) -> Self {
        Self {
            config: RwLock::new(config),
            manager: RwLock::new(None),
        }
    }

    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    /// Build the manager over SeaORM repositories sharing `db`
    pub fn init(&self, db: Arc<DatabaseConnection>) -> Result<SettingsManager> {
        self.init_with_events(db, None)
    }

    /// Like [`Self::init`], publishing lifecycle events to `events`
    pub fn init_with_events(
        &self,
        db: Arc<DatabaseConnection>,
        events: Option<Arc<dyn EventPublisher>>,
    ) -> Result<SettingsManager> {
        let config = self.config();

        let settings_repo = Arc::new(SeaOrmSettingsRepository::new(db.clone()));
        let user_repo = Arc::new(SeaOrmUserSettingsRepository::new(db.clone()));
        let history_repo = Arc::new(SeaOrmHistoryRepository::new(db));

        let mut manager = SettingsManager::new(settings_repo, user_repo, history_repo, &config);
        if let Some(events) = events {
            manager = manager.with_event_publisher(events);
        }
        *self.manager.write() = Some(manager.clone());

        tracing::info!(
            cache_enabled = config.cache.enabled,
            audit_enabled = config.audit.enabled,
            "Settings manager initialized"
        );
        Ok(manager)
    }

    /// Create or upgrade the settings tables
    pub async fn migrate(&self, db: &DatabaseConnection) -> Result<()> {
        Migrator::up(db, None).await?;
        tracing::info!("Settings manager migrations completed");
        Ok(())
    }

    /// Initialized manager
    pub fn manager(&self) -> Result<SettingsManager> {
        self.manager
            .read()
            .as_ref()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Settings manager not initialized"))
    }

    /// Read-only client for in-process consumers
    pub fn client(&self) -> Result<Arc<dyn SettingsLookup>> {
        Ok(Arc::new(NativeClient::new(self.manager()?)))
    }

    /// Mount the `/settings` routes on `router`
    pub fn register_rest(&self, router: axum::Router) -> Result<axum::Router> {
        let manager = self.manager()?;
        tracing::info!("Registering settings REST routes");
        Ok(crate::api::rest::routes::register_routes(router, manager))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_requires_init() {
        let module = SettingsModule::default();
        assert!(module.manager().is_err());
        assert!(module.client().is_err());
        assert!(module.register_rest(axum::Router::new()).is_err());
    }

    #[test]
    fn test_config_is_kept() {
        let config = Config {
            default_locale: "fr".to_string(),
            ..Config::default()
        };
        let module = SettingsModule::new(config);
        assert_eq!(module.config().default_locale, "fr");
    }
}
