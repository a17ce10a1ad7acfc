//! Route registration

use super::{dto::*, error::Problem, handlers};
use crate::domain::SettingsManager;
use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    routing::get,
    Extension, Json, Router,
};

/// Register all REST routes
pub fn register_routes(router: Router, manager: SettingsManager) -> Router {
    router
        .route("/settings", get(list_settings_handler).post(create_setting_handler))
        .route(
            "/settings/{key}",
            get(get_setting_handler)
                .put(update_setting_handler)
                .delete(delete_setting_handler),
        )
        .layer(Extension(manager))
}

// ===== Handler wrappers that extract the manager from Extension =====

async fn list_settings_handler(
    Extension(manager): Extension<SettingsManager>,
    query: Query<handlers::ListSettingsQuery>,
) -> Result<Json<Vec<SettingDto>>, Problem> {
    handlers::list_settings(manager, query).await
}

async fn get_setting_handler(
    Extension(manager): Extension<SettingsManager>,
    path: Path<String>,
) -> Result<Json<SettingDto>, Problem> {
    handlers::get_setting(manager, path).await
}

async fn create_setting_handler(
    Extension(manager): Extension<SettingsManager>,
    headers: HeaderMap,
    json: Json<CreateSettingRequest>,
) -> Result<(StatusCode, Json<SettingDto>), Problem> {
    handlers::create_setting(manager, headers, json).await
}

async fn update_setting_handler(
    Extension(manager): Extension<SettingsManager>,
    headers: HeaderMap,
    path: Path<String>,
    json: Json<UpdateSettingRequest>,
) -> Result<Json<SettingDto>, Problem> {
    handlers::update_setting(manager, headers, path, json).await
}

async fn delete_setting_handler(
    Extension(manager): Extension<SettingsManager>,
    headers: HeaderMap,
    path: Path<String>,
) -> Result<Json<MessageResponse>, Problem> {
    handlers::delete_setting(manager, headers, path).await
}
