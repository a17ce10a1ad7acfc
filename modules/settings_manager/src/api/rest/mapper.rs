//! Mapper implementations for converting contract models into DTOs

use super::dto::*;
use crate::contract;
use crate::domain::manager::decoded_value;

impl From<contract::Setting> for SettingDto {
    fn from(setting: contract::Setting) -> Self {
        let value = if setting.encrypted {
            serde_json::Value::String(ENCRYPTED_PLACEHOLDER.to_string())
        } else {
            decoded_value(&setting)
        };

        Self {
            key: setting.key,
            value,
            setting_type: setting.r#type.as_str().to_string(),
            group: setting.group,
            label: setting.label,
            description: setting.description,
            is_public: setting.is_public,
            encrypted: setting.encrypted,
            order: setting.order,
            created_at: setting.created_at,
            updated_at: setting.updated_at,
        }
    }
}
