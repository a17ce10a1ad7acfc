//! Contract models for the settings manager
//!
//! These models are transport-agnostic and shared by the domain, storage and
//! API layers. NO serde derives - wire shapes live next to the transports.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Locale code -> display text
pub type Translations = BTreeMap<String, String>;

/// Logical type tag recorded next to every stored value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SettingType {
    #[default]
    String,
    Int,
    Bool,
    Float,
    Array,
}

impl SettingType {
    /// Canonical tag written to storage
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Float => "float",
            Self::Array => "array",
        }
    }

    /// Parse a stored tag. Long-form aliases written by older rows are
    /// accepted; anything unrecognised decodes as plain text.
    pub fn parse(tag: &str) -> Self {
        match tag {
            "int" | "integer" => Self::Int,
            "bool" | "boolean" => Self::Bool,
            "float" | "double" => Self::Float,
            "array" | "json" | "object" => Self::Array,
            _ => Self::String,
        }
    }
}

impl std::fmt::Display for SettingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Global, key-unique configuration entry
#[derive(Debug, Clone, PartialEq)]
pub struct Setting {
    /// Surrogate id assigned by the store
    pub id: i64,
    /// Unique lookup key (e.g. "site.name")
    pub key: String,
    /// Free-form category label
    pub group: Option<String>,
    /// Stored text: plain scalar, JSON for arrays, ciphertext when encrypted
    pub value: Option<String>,
    /// Type tag driving decode
    pub r#type: SettingType,
    /// Whether `value` holds ciphertext
    pub encrypted: bool,
    /// Localized display label
    pub label: Option<Translations>,
    /// Localized description
    pub description: Option<Translations>,
    /// Ordered rule descriptors for the validation collaborator
    pub validation_rules: Option<Vec<serde_json::Value>>,
    /// Allowed choices (flat list or locale-mapped)
    pub options: Option<serde_json::Value>,
    /// UI input hint
    pub input_type: String,
    /// Exposed to unauthenticated consumers
    pub is_public: bool,
    /// Ascending sort key
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Configuration entry scoped to one principal, unique per (user_id, key)
#[derive(Debug, Clone, PartialEq)]
pub struct UserSetting {
    pub id: i64,
    pub user_id: Uuid,
    pub key: String,
    pub group: Option<String>,
    pub value: Option<String>,
    pub r#type: SettingType,
    pub encrypted: bool,
    pub label: Option<Translations>,
    pub description: Option<Translations>,
    pub validation_rules: Option<Vec<serde_json::Value>>,
    pub options: Option<serde_json::Value>,
    pub input_type: String,
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Kind of change captured by a history record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Created,
    Updated,
    Deleted,
}

impl HistoryAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }

    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "created" => Some(Self::Created),
            "updated" => Some(Self::Updated),
            "deleted" => Some(Self::Deleted),
            _ => None,
        }
    }
}

impl std::fmt::Display for HistoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit record of one change to a global setting
#[derive(Debug, Clone, PartialEq)]
pub struct SettingHistory {
    pub id: i64,
    pub setting_key: String,
    /// Raw stored text before the change
    pub old_value: Option<String>,
    /// Raw stored text after the change
    pub new_value: Option<String>,
    pub old_type: Option<SettingType>,
    pub new_type: Option<SettingType>,
    pub action: HistoryAction,
    pub user_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Who performed a change and from where
///
/// Passed explicitly to the manager; nothing is read from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActorContext {
    /// Authenticated principal, if any
    pub user_id: Option<Uuid>,
    /// Request IP address
    pub ip_address: Option<String>,
    /// Request user agent
    pub user_agent: Option<String>,
}

impl ActorContext {
    /// Context with no principal and no request provenance
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for an authenticated principal without request details
    pub fn user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn with_ip(mut self, ip_address: impl Into<String>) -> Self {
        self.ip_address = Some(ip_address.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

/// Authenticated principal that user settings are scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Principal {
    pub id: Uuid,
}

impl Principal {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}

impl From<Uuid> for Principal {
    fn from(id: Uuid) -> Self {
        Self { id }
    }
}
