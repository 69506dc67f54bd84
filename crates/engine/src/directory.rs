//! PostgreSQL-backed collaborators of the dispatcher.

use async_trait::async_trait;
use sqlx::PgPool;

use okusuri_common::error::AppError;
use okusuri_common::types::{LogEntry, NotificationSetting, Recipient};

use crate::dispatch::{LogHistorySource, RecipientDirectory};
use crate::medication::MedicationService;

/// Recipient directory and history source over the service database.
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipientDirectory for PgDirectory {
    /// Every stored setting, each tied to its owner through `user_id`.
    async fn list_recipients(&self) -> Result<Vec<Recipient>, AppError> {
        let settings: Vec<NotificationSetting> = sqlx::query_as(
            "SELECT * FROM notification_settings ORDER BY user_id, platform",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(settings.into_iter().map(Recipient::from).collect())
    }
}

#[async_trait]
impl LogHistorySource for PgDirectory {
    async fn log_history(&self, recipient_id: &str) -> Result<Vec<LogEntry>, AppError> {
        MedicationService::entries(&self.pool, recipient_id).await
    }
}
