//! REST DTOs with serde derives for HTTP API

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Placeholder rendered instead of the value of an encrypted setting
pub const ENCRYPTED_PLACEHOLDER: &str = "***encrypted***";

// ===== Setting DTOs =====

/// Setting response DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SettingDto {
    /// Unique key
    #[schema(example = "site.name")]
    pub key: String,

    /// Decoded value; encrypted values are masked
    pub value: serde_json::Value,

    /// Stored type tag
    #[serde(rename = "type")]
    #[schema(example = "string")]
    pub setting_type: String,

    #[schema(example = "site")]
    pub group: Option<String>,

    /// Locale -> label
    pub label: Option<BTreeMap<String, String>>,

    /// Locale -> description
    pub description: Option<BTreeMap<String, String>>,

    pub is_public: bool,

    pub encrypted: bool,

    pub order: i32,

    pub created_at: chrono::DateTime<chrono::Utc>,

    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Create request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateSettingRequest {
    #[schema(example = "site.name")]
    pub key: String,

    pub value: serde_json::Value,

    #[serde(default)]
    pub group: Option<String>,

    /// Store the value encrypted
    #[serde(default)]
    pub encrypted: bool,
}

/// Update request
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateSettingRequest {
    pub value: serde_json::Value,

    /// Omitted keeps the current group
    #[serde(default)]
    pub group: Option<String>,
}

/// Delete acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}
