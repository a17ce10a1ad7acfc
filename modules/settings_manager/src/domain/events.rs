//! Lifecycle events for global settings
//!
//! Published by the manager after a successful write, once the audit record
//! and cache invalidation have run. Events carry the key and type only, never
//! the stored value, so encrypted text does not leak to subscribers.

use crate::contract::{HistoryAction, Setting};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Domain event types for settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum SettingEvent {
    /// Setting was created
    Created(SettingChangedEvent),
    /// Setting was updated, including restores from history
    Updated(SettingChangedEvent),
    /// Setting was deleted
    Deleted(SettingDeletedEvent),
}

/// Event data for create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingChangedEvent {
    /// Setting key
    pub key: String,
    /// Group label at the time of the write
    pub group: Option<String>,
    /// Stored type tag ("string", "int", ...)
    pub setting_type: String,
    /// Whether the stored text is ciphertext
    pub encrypted: bool,
    /// Timestamp of the event
    pub timestamp: DateTime<Utc>,
    /// User who performed the action (if available)
    pub user_id: Option<Uuid>,
}

/// Event data for setting deletion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingDeletedEvent {
    /// Setting key
    pub key: String,
    /// Timestamp of the event
    pub timestamp: DateTime<Utc>,
    /// User who performed the action (if available)
    pub user_id: Option<Uuid>,
}

/// Event publisher trait for publishing domain events
///
/// Implementations decide on transport. Errors are logged by the caller and
/// never fail the write that produced the event.
#[async_trait::async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: SettingEvent) -> anyhow::Result<()>;
}

/// No-op event publisher for testing or when events are disabled
pub struct NoOpEventPublisher;

#[async_trait::async_trait]
impl EventPublisher for NoOpEventPublisher {
    async fn publish(&self, _event: SettingEvent) -> anyhow::Result<()> {
        Ok(())
    }
}

impl SettingEvent {
    /// Event for a persisted create or update
    pub fn written(setting: &Setting, is_new: bool, user_id: Option<Uuid>) -> Self {
        let data = SettingChangedEvent {
            key: setting.key.clone(),
            group: setting.group.clone(),
            setting_type: setting.r#type.as_str().to_string(),
            encrypted: setting.encrypted,
            timestamp: Utc::now(),
            user_id,
        };
        if is_new {
            SettingEvent::Created(data)
        } else {
            SettingEvent::Updated(data)
        }
    }

    /// Event for a deleted key
    pub fn deleted(key: &str, user_id: Option<Uuid>) -> Self {
        SettingEvent::Deleted(SettingDeletedEvent {
            key: key.to_string(),
            timestamp: Utc::now(),
            user_id,
        })
    }

    pub fn key(&self) -> &str {
        match self {
            SettingEvent::Created(e) | SettingEvent::Updated(e) => &e.key,
            SettingEvent::Deleted(e) => &e.key,
        }
    }

    /// History action matching this event
    pub fn action(&self) -> HistoryAction {
        match self {
            SettingEvent::Created(_) => HistoryAction::Created,
            SettingEvent::Updated(_) => HistoryAction::Updated,
            SettingEvent::Deleted(_) => HistoryAction::Deleted,
        }
    }
}
