//! HTTP request handlers - thin layer that delegates to the settings manager

use super::{dto::*, error::{map_domain_error, Problem}};
use crate::contract::{ActorContext, SettingsError};
use crate::domain::SettingsManager;
use axum::{
    extract::{Path, Query},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::Deserialize;

/// Query parameters for listing settings
#[derive(Debug, Default, Deserialize)]
pub struct ListSettingsQuery {
    /// Only settings in this group
    pub group: Option<String>,
    /// Only public settings
    #[serde(default)]
    pub public: bool,
}

/// Request provenance recorded in history rows
fn actor_from(headers: &HeaderMap) -> ActorContext {
    let mut actor = ActorContext::anonymous();
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        actor = actor.with_ip(ip);
    }
    if let Some(agent) = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
    {
        actor = actor.with_user_agent(agent);
    }
    actor
}

fn not_found(key: &str) -> Problem {
    map_domain_error(SettingsError::setting_not_found(key)).with_instance(format!("/settings/{}", key))
}

/// List settings ordered by `order`
pub async fn list_settings(
    manager: SettingsManager,
    Query(query): Query<ListSettingsQuery>,
) -> Result<Json<Vec<SettingDto>>, Problem> {
    let settings = manager
        .all_with_metadata(query.group.as_deref())
        .await
        .map_err(map_domain_error)?;

    let items = settings
        .into_iter()
        .filter(|s| !query.public || s.is_public)
        .map(SettingDto::from)
        .collect();

    Ok(Json(items))
}

/// Get one setting
pub async fn get_setting(
    manager: SettingsManager,
    Path(key): Path<String>,
) -> Result<Json<SettingDto>, Problem> {
    let setting = manager
        .find(&key)
        .await
        .map_err(map_domain_error)?
        .ok_or_else(|| not_found(&key))?;

    Ok(Json(setting.into()))
}

/// Create a setting; an existing key is a conflict
pub async fn create_setting(
    manager: SettingsManager,
    headers: HeaderMap,
    Json(req): Json<CreateSettingRequest>,
) -> Result<(StatusCode, Json<SettingDto>), Problem> {
    if req.key.trim().is_empty() {
        return Err(map_domain_error(SettingsError::Validation {
            field: "key".to_string(),
            messages: vec!["The key field is required.".to_string()],
        }));
    }

    let exists = manager.has(&req.key).await.map_err(map_domain_error)?;
    if exists {
        return Err(map_domain_error(SettingsError::Conflict {
            reason: format!("setting '{}' already exists", req.key),
        }));
    }

    let manager = manager.with_actor(actor_from(&headers));
    let setting = if req.encrypted {
        manager
            .set_encrypted(&req.key, req.value, req.group.as_deref())
            .await
    } else {
        manager.set(&req.key, req.value, req.group.as_deref()).await
    }
    .map_err(map_domain_error)?;

    Ok((StatusCode::CREATED, Json(setting.into())))
}

/// Replace the value of an existing setting
pub async fn update_setting(
    manager: SettingsManager,
    headers: HeaderMap,
    Path(key): Path<String>,
    Json(req): Json<UpdateSettingRequest>,
) -> Result<Json<SettingDto>, Problem> {
    let existing = manager
        .find(&key)
        .await
        .map_err(map_domain_error)?
        .ok_or_else(|| not_found(&key))?;

    let manager = manager.with_actor(actor_from(&headers));
    let setting = if existing.encrypted {
        manager
            .set_encrypted(&key, req.value, req.group.as_deref())
            .await
    } else {
        manager.set(&key, req.value, req.group.as_deref()).await
    }
    .map_err(map_domain_error)?;

    Ok(Json(setting.into()))
}

/// Delete a setting
pub async fn delete_setting(
    manager: SettingsManager,
    headers: HeaderMap,
    Path(key): Path<String>,
) -> Result<Json<MessageResponse>, Problem> {
    manager
        .with_actor(actor_from(&headers))
        .forget(&key)
        .await
        .map_err(map_domain_error)?;

    Ok(Json(MessageResponse {
        message: "Setting deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_actor_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.0"));

        let actor = actor_from(&headers);
        assert_eq!(actor.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(actor.user_agent.as_deref(), Some("curl/8.0"));
        assert_eq!(actor.user_id, None);
    }

    #[test]
    fn test_actor_from_empty_headers() {
        assert_eq!(actor_from(&HeaderMap::new()), ActorContext::anonymous());
    }
}
