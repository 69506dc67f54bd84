//! Notification setting service: per-user, per-platform push preferences.
//!
//! The browser `PushSubscription` is validated on the way in so the
//! dispatcher only ever sees subscriptions that parsed once; the endpoint is
//! stored in its own column and used as the dedup key.

use sqlx::PgPool;

use okusuri_common::error::AppError;
use okusuri_common::types::{NotificationSetting, PushSubscription};

pub const DEFAULT_PLATFORM: &str = "web";

/// Service layer for notification settings.
pub struct NotificationSettingService;

/// Parameters for creating or replacing a setting.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterSettingParams {
    pub platform: String,
    pub is_enabled: bool,
    #[serde(default)]
    pub subscription: Option<String>,
}

impl NotificationSettingService {
    /// Get a user's setting for one platform.
    pub async fn get(
        pool: &PgPool,
        user_id: &str,
        platform: &str,
    ) -> Result<NotificationSetting, AppError> {
        let setting: NotificationSetting = sqlx::query_as(
            "SELECT * FROM notification_settings WHERE user_id = $1 AND platform = $2",
        )
        .bind(user_id)
        .bind(platform)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Notification setting for '{}' not found", platform))
        })?;

        Ok(setting)
    }

    /// Create or replace a user's setting for `params.platform`.
    pub async fn register(
        pool: &PgPool,
        user_id: &str,
        params: &RegisterSettingParams,
    ) -> Result<NotificationSetting, AppError> {
        let platform = params.platform.trim();
        if platform.is_empty() {
            return Err(AppError::Validation("platform is required".to_string()));
        }

        let subscription = params.subscription.as_deref().unwrap_or("").trim();
        let endpoint = Self::endpoint_of(subscription)?;

        let setting: NotificationSetting = sqlx::query_as(
            r#"
            INSERT INTO notification_settings (user_id, platform, is_enabled, endpoint, subscription)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, platform) DO UPDATE
            SET is_enabled = EXCLUDED.is_enabled,
                endpoint = EXCLUDED.endpoint,
                subscription = EXCLUDED.subscription,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(platform)
        .bind(params.is_enabled)
        .bind(&endpoint)
        .bind(subscription)
        .fetch_one(pool)
        .await?;

        tracing::info!(
            user_id = %user_id,
            platform = %platform,
            is_enabled = params.is_enabled,
            subscribed = !endpoint.is_empty(),
            "Notification setting saved"
        );

        Ok(setting)
    }

    /// Extract the push endpoint from a subscription blob. An empty blob
    /// means "no subscription" and yields an empty endpoint.
    pub fn endpoint_of(subscription: &str) -> Result<String, AppError> {
        if subscription.is_empty() {
            return Ok(String::new());
        }

        let parsed = PushSubscription::parse(subscription)
            .map_err(|e| AppError::Validation(format!("Invalid push subscription: {}", e)))?;
        if parsed.endpoint.is_empty() {
            return Err(AppError::Validation(
                "Push subscription endpoint is empty".to_string(),
            ));
        }

        Ok(parsed.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_of_empty_subscription() {
        assert_eq!(NotificationSettingService::endpoint_of("").unwrap(), "");
    }

    #[test]
    fn test_endpoint_of_valid_subscription() {
        let raw = r#"{"endpoint":"https://push.example/abc","keys":{"p256dh":"k","auth":"a"}}"#;
        assert_eq!(
            NotificationSettingService::endpoint_of(raw).unwrap(),
            "https://push.example/abc"
        );
    }

    #[test]
    fn test_endpoint_of_rejects_garbage() {
        let err = NotificationSettingService::endpoint_of("{oops").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let raw = r#"{"endpoint":"","keys":{"p256dh":"k","auth":"a"}}"#;
        assert!(matches!(
            NotificationSettingService::endpoint_of(raw),
            Err(AppError::Validation(_))
        ));
    }
}
