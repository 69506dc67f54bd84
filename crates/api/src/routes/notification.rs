//! Notification setting routes.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use okusuri_common::error::AppError;
use okusuri_common::types::NotificationSetting;
use okusuri_engine::notification_setting::{
    DEFAULT_PLATFORM, NotificationSettingService, RegisterSettingParams,
};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/notification/setting",
        get(get_setting).post(register_setting),
    )
}

#[derive(Debug, Deserialize)]
struct PlatformQuery {
    platform: Option<String>,
}

/// GET /api/notification/setting?platform=web: The caller's setting.
async fn get_setting(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PlatformQuery>,
) -> Result<Json<NotificationSetting>, AppError> {
    let platform = query.platform.as_deref().unwrap_or(DEFAULT_PLATFORM);
    let setting = NotificationSettingService::get(&state.pool, &auth.user_id, platform).await?;
    Ok(Json(setting))
}

/// POST /api/notification/setting: Create or replace the caller's setting.
async fn register_setting(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(params): Json<RegisterSettingParams>,
) -> Result<Json<NotificationSetting>, AppError> {
    let setting = NotificationSettingService::register(&state.pool, &auth.user_id, &params).await?;
    Ok(Json(setting))
}
