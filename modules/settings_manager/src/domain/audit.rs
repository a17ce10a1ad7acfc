//! History recorder for global settings
//!
//! Recording is best-effort: the setting write has already committed by the
//! time a record is appended, so failures are logged and swallowed.

use crate::config::AuditConfig;
use crate::contract::{ActorContext, HistoryAction, SettingHistory, SettingType};
use crate::domain::codec;
use crate::domain::repository::{HistoryRepository, NewHistory};
use serde_json::Value;
use std::sync::Arc;

/// One observed change, expressed in stored text
#[derive(Debug, Clone, PartialEq)]
pub struct Change<'a> {
    pub key: &'a str,
    pub old_value: Option<&'a str>,
    pub new_value: Option<&'a str>,
    pub old_type: Option<SettingType>,
    pub new_type: Option<SettingType>,
    pub action: HistoryAction,
}

/// Decoded `old_value` of a history record
pub fn old_value(entry: &SettingHistory) -> Value {
    codec::decode(
        entry.old_value.as_deref(),
        entry.old_type.unwrap_or_default(),
    )
}

/// Decoded `new_value` of a history record
pub fn new_value(entry: &SettingHistory) -> Value {
    codec::decode(
        entry.new_value.as_deref(),
        entry.new_type.unwrap_or_default(),
    )
}

#[derive(Clone)]
pub struct HistoryRecorder {
    repo: Arc<dyn HistoryRepository>,
    config: AuditConfig,
}

impl HistoryRecorder {
    pub fn new(repo: Arc<dyn HistoryRepository>, config: AuditConfig) -> Self {
        Self { repo, config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Append one history row. Provenance fields are attached only when
    /// their tracking flag is on and the actor carries them.
    pub async fn record(&self, change: Change<'_>, actor: &ActorContext) {
        if !self.config.enabled {
            return;
        }

        let entry = NewHistory {
            setting_key: change.key.to_string(),
            old_value: change.old_value.map(str::to_string),
            new_value: change.new_value.map(str::to_string),
            old_type: change.old_type,
            new_type: change.new_type,
            action: change.action,
            user_id: actor.user_id,
            ip_address: actor
                .ip_address
                .clone()
                .filter(|_| self.config.track_ip),
            user_agent: actor
                .user_agent
                .clone()
                .filter(|_| self.config.track_user_agent),
        };

        match self.repo.append(&entry).await {
            Ok(saved) => {
                tracing::debug!(key = change.key, action = %change.action, id = saved.id, "recorded setting history");
            }
            Err(e) => {
                tracing::warn!(key = change.key, action = %change.action, error = %e, "failed to record setting history");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use parking_lot::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct CapturingRepo {
        entries: Mutex<Vec<NewHistory>>,
        fail: bool,
    }

    #[async_trait]
    impl HistoryRepository for CapturingRepo {
        async fn append(&self, entry: &NewHistory) -> anyhow::Result<SettingHistory> {
            if self.fail {
                anyhow::bail!("history table unavailable");
            }
            let mut entries = self.entries.lock();
            entries.push(entry.clone());
            Ok(SettingHistory {
                id: entries.len() as i64,
                setting_key: entry.setting_key.clone(),
                old_value: entry.old_value.clone(),
                new_value: entry.new_value.clone(),
                old_type: entry.old_type,
                new_type: entry.new_type,
                action: entry.action,
                user_id: entry.user_id,
                ip_address: entry.ip_address.clone(),
                user_agent: entry.user_agent.clone(),
                created_at: Utc::now(),
            })
        }

        async fn find_by_id(&self, _id: i64) -> anyhow::Result<Option<SettingHistory>> {
            Ok(None)
        }

        async fn list_for_key(&self, _key: &str, _limit: u64) -> anyhow::Result<Vec<SettingHistory>> {
            Ok(Vec::new())
        }

        async fn list_recent(&self, _limit: u64) -> anyhow::Result<Vec<SettingHistory>> {
            Ok(Vec::new())
        }
    }

    fn change() -> Change<'static> {
        Change {
            key: "site.name",
            old_value: Some("a"),
            new_value: Some("b"),
            old_type: Some(SettingType::String),
            new_type: Some(SettingType::String),
            action: HistoryAction::Updated,
        }
    }

    fn actor() -> ActorContext {
        ActorContext::user(Uuid::new_v4())
            .with_ip("192.168.1.10")
            .with_user_agent("Mozilla/5.0")
    }

    #[tokio::test]
    async fn test_records_provenance_when_tracked() {
        let repo = Arc::new(CapturingRepo::default());
        let recorder = HistoryRecorder::new(repo.clone(), AuditConfig::default());
        let actor = actor();

        recorder.record(change(), &actor).await;

        let entries = repo.entries.lock();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user_id, actor.user_id);
        assert_eq!(entries[0].ip_address.as_deref(), Some("192.168.1.10"));
        assert_eq!(entries[0].user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(entries[0].old_value.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_tracking_flags_strip_fields() {
        let repo = Arc::new(CapturingRepo::default());
        let config = AuditConfig {
            track_ip: false,
            track_user_agent: false,
            ..AuditConfig::default()
        };
        let recorder = HistoryRecorder::new(repo.clone(), config);

        recorder.record(change(), &actor()).await;

        let entries = repo.entries.lock();
        assert!(entries[0].user_id.is_some());
        assert_eq!(entries[0].ip_address, None);
        assert_eq!(entries[0].user_agent, None);
    }

    #[tokio::test]
    async fn test_disabled_records_nothing() {
        let repo = Arc::new(CapturingRepo::default());
        let config = AuditConfig {
            enabled: false,
            ..AuditConfig::default()
        };
        let recorder = HistoryRecorder::new(repo.clone(), config);

        recorder.record(change(), &actor()).await;
        assert!(repo.entries.lock().is_empty());
    }

    #[test]
    fn test_history_values_decode_with_types() {
        let entry = SettingHistory {
            id: 1,
            setting_key: "app.page_size".to_string(),
            old_value: Some("25".to_string()),
            new_value: Some("[1,2]".to_string()),
            old_type: Some(SettingType::Int),
            new_type: Some(SettingType::Array),
            action: HistoryAction::Updated,
            user_id: None,
            ip_address: None,
            user_agent: None,
            created_at: Utc::now(),
        };
        assert_eq!(old_value(&entry), serde_json::json!(25));
        assert_eq!(new_value(&entry), serde_json::json!([1, 2]));
    }

    #[tokio::test]
    async fn test_failure_is_swallowed() {
        let repo = Arc::new(CapturingRepo {
            fail: true,
            ..CapturingRepo::default()
        });
        let recorder = HistoryRecorder::new(repo, AuditConfig::default());
        recorder.record(change(), &ActorContext::anonymous()).await;
    }
}
