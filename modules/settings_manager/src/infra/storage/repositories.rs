//! SeaORM repository implementations

use crate::contract::{Setting, SettingHistory, UserSetting};
use crate::domain::repository::{
    apply_change, apply_user_change, new_setting, new_user_setting, HistoryRepository, NewHistory,
    SettingChange, SettingFilter, SettingsRepository, Upserted, UserSettingsRepository,
};
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use std::sync::Arc;
use uuid::Uuid;

use super::entity::{setting, setting_history, user_setting};

// ===== Settings Repository =====

pub struct SeaOrmSettingsRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmSettingsRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_model(&self, key: &str) -> Result<Option<setting::Model>> {
        Ok(setting::Entity::find()
            .filter(setting::Column::Key.eq(key))
            .one(&*self.db)
            .await?)
    }
}

#[async_trait]
impl SettingsRepository for SeaOrmSettingsRepository {
    async fn find_by_key(&self, key: &str) -> Result<Option<Setting>> {
        Ok(self.find_model(key).await?.map(Into::into))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let count = setting::Entity::find()
            .filter(setting::Column::Key.eq(key))
            .count(&*self.db)
            .await?;

        Ok(count > 0)
    }

    async fn list(&self, filter: &SettingFilter) -> Result<Vec<Setting>> {
        let mut query = setting::Entity::find();

        if let Some(group) = &filter.group {
            query = query.filter(setting::Column::Group.eq(group.as_str()));
        }
        if filter.public_only {
            query = query.filter(setting::Column::IsPublic.eq(true));
        }
        if filter.exclude_encrypted {
            query = query.filter(setting::Column::Encrypted.eq(false));
        }

        let results = query
            .order_by_asc(setting::Column::Order)
            .order_by_asc(setting::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn upsert(&self, change: &SettingChange) -> Result<Upserted<Setting>> {
        let now = chrono::Utc::now();

        match self.find_model(&change.key).await? {
            Some(existing) => {
                let previous: Setting = existing.into();
                let mut updated = previous.clone();
                apply_change(&mut updated, change, now);

                let active: setting::ActiveModel = (&updated).into();
                let saved = active.update(&*self.db).await?;
                Ok(Upserted {
                    current: saved.into(),
                    previous: Some(previous),
                })
            }
            None => {
                let fresh = new_setting(0, change, now);
                let active: setting::ActiveModel = (&fresh).into();
                let saved = active.insert(&*self.db).await?;
                Ok(Upserted {
                    current: saved.into(),
                    previous: None,
                })
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<Option<Setting>> {
        let Some(existing) = self.find_model(key).await? else {
            return Ok(None);
        };

        setting::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;

        Ok(Some(existing.into()))
    }
}

// ===== User Settings Repository =====

pub struct SeaOrmUserSettingsRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmUserSettingsRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_model(&self, user_id: Uuid, key: &str) -> Result<Option<user_setting::Model>> {
        Ok(user_setting::Entity::find()
            .filter(user_setting::Column::UserId.eq(user_id))
            .filter(user_setting::Column::Key.eq(key))
            .one(&*self.db)
            .await?)
    }
}

#[async_trait]
impl UserSettingsRepository for SeaOrmUserSettingsRepository {
    async fn find_by_key(&self, user_id: Uuid, key: &str) -> Result<Option<UserSetting>> {
        Ok(self.find_model(user_id, key).await?.map(Into::into))
    }

    async fn exists(&self, user_id: Uuid, key: &str) -> Result<bool> {
        let count = user_setting::Entity::find()
            .filter(user_setting::Column::UserId.eq(user_id))
            .filter(user_setting::Column::Key.eq(key))
            .count(&*self.db)
            .await?;

        Ok(count > 0)
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<UserSetting>> {
        let results = user_setting::Entity::find()
            .filter(user_setting::Column::UserId.eq(user_id))
            .order_by_asc(user_setting::Column::Order)
            .order_by_asc(user_setting::Column::Id)
            .all(&*self.db)
            .await?;

        Ok(results.into_iter().map(Into::into).collect())
    }

    async fn upsert(&self, user_id: Uuid, change: &SettingChange) -> Result<Upserted<UserSetting>> {
        let now = chrono::Utc::now();

        match self.find_model(user_id, &change.key).await? {
            Some(existing) => {
                let previous: UserSetting = existing.into();
                let mut updated = previous.clone();
                apply_user_change(&mut updated, change, now);

                let active: user_setting::ActiveModel = (&updated).into();
                let saved = active.update(&*self.db).await?;
                Ok(Upserted {
                    current: saved.into(),
                    previous: Some(previous),
                })
            }
            None => {
                let fresh = new_user_setting(0, user_id, change, now);
                let active: user_setting::ActiveModel = (&fresh).into();
                let saved = active.insert(&*self.db).await?;
                Ok(Upserted {
                    current: saved.into(),
                    previous: None,
                })
            }
        }
    }

    async fn delete(&self, user_id: Uuid, key: &str) -> Result<Option<UserSetting>> {
        let Some(existing) = self.find_model(user_id, key).await? else {
            return Ok(None);
        };

        user_setting::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;

        Ok(Some(existing.into()))
    }

    async fn delete_all(&self, user_id: Uuid) -> Result<u64> {
        let result = user_setting::Entity::delete_many()
            .filter(user_setting::Column::UserId.eq(user_id))
            .exec(&*self.db)
            .await?;

        Ok(result.rows_affected)
    }
}

// ===== History Repository =====

pub struct SeaOrmHistoryRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmHistoryRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HistoryRepository for SeaOrmHistoryRepository {
    async fn append(&self, entry: &NewHistory) -> Result<SettingHistory> {
        let active: setting_history::ActiveModel = entry.into();
        let saved = active.insert(&*self.db).await?;
        saved.try_into()
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<SettingHistory>> {
        match setting_history::Entity::find_by_id(id).one(&*self.db).await? {
            Some(entity) => Ok(Some(entity.try_into()?)),
            None => Ok(None),
        }
    }

    async fn list_for_key(&self, key: &str, limit: u64) -> Result<Vec<SettingHistory>> {
        let results = setting_history::Entity::find()
            .filter(setting_history::Column::SettingKey.eq(key))
            .order_by_desc(setting_history::Column::CreatedAt)
            .order_by_desc(setting_history::Column::Id)
            .limit(limit)
            .all(&*self.db)
            .await?;

        results
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>>>()
    }

    async fn list_recent(&self, limit: u64) -> Result<Vec<SettingHistory>> {
        let results = setting_history::Entity::find()
            .order_by_desc(setting_history::Column::CreatedAt)
            .order_by_desc(setting_history::Column::Id)
            .limit(limit)
            .all(&*self.db)
            .await?;

        results
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<_>>>()
    }
}
