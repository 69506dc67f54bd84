//! Medication log service: records and reads a user's daily intake logs.

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use okusuri_common::error::AppError;
use okusuri_common::types::{LogEntry, MedicationLog};

use crate::adherence::{AdherenceCalculator, AdherenceStatus};

/// Service layer for medication log CRUD operations.
pub struct MedicationService;

/// Parameters for recording a medication log.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterLogParams {
    #[serde(default)]
    pub has_bleeding: bool,
    /// Day the dose was taken; defaults to today.
    pub date: Option<NaiveDate>,
}

/// Parameters for updating an existing log.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLogParams {
    pub has_bleeding: bool,
}

impl MedicationService {
    /// Record a medication log for a user.
    pub async fn register(
        pool: &PgPool,
        user_id: &str,
        params: &RegisterLogParams,
        today: NaiveDate,
    ) -> Result<MedicationLog, AppError> {
        let taken_on = params.date.unwrap_or(today);

        let log: MedicationLog = sqlx::query_as(
            r#"
            INSERT INTO medication_logs (id, user_id, taken_on, has_bleeding)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(taken_on)
        .bind(params.has_bleeding)
        .fetch_one(pool)
        .await?;

        tracing::info!(
            log_id = %log.id,
            user_id = %user_id,
            taken_on = %taken_on,
            has_bleeding = params.has_bleeding,
            "Medication log recorded"
        );

        Ok(log)
    }

    /// List a user's logs, newest first.
    pub async fn list_by_user(pool: &PgPool, user_id: &str) -> Result<Vec<MedicationLog>, AppError> {
        let logs: Vec<MedicationLog> = sqlx::query_as(
            "SELECT * FROM medication_logs WHERE user_id = $1 ORDER BY taken_on DESC, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(logs)
    }

    /// Get one of the user's logs. Logs owned by someone else are reported
    /// as missing.
    pub async fn get(pool: &PgPool, user_id: &str, log_id: Uuid) -> Result<MedicationLog, AppError> {
        let log: MedicationLog =
            sqlx::query_as("SELECT * FROM medication_logs WHERE id = $1 AND user_id = $2")
                .bind(log_id)
                .bind(user_id)
                .fetch_optional(pool)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Medication log {} not found", log_id)))?;

        Ok(log)
    }

    /// Update the bleeding flag of one of the user's logs.
    pub async fn update(
        pool: &PgPool,
        user_id: &str,
        log_id: Uuid,
        params: &UpdateLogParams,
    ) -> Result<MedicationLog, AppError> {
        let log: MedicationLog = sqlx::query_as(
            r#"
            UPDATE medication_logs
            SET has_bleeding = $1, updated_at = NOW()
            WHERE id = $2 AND user_id = $3
            RETURNING *
            "#,
        )
        .bind(params.has_bleeding)
        .bind(log_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Medication log {} not found", log_id)))?;

        tracing::info!(
            log_id = %log_id,
            has_bleeding = params.has_bleeding,
            "Medication log updated"
        );

        Ok(log)
    }

    /// The user's history as calculator input, newest first.
    pub async fn entries(pool: &PgPool, user_id: &str) -> Result<Vec<LogEntry>, AppError> {
        let logs: Vec<MedicationLog> = sqlx::query_as(
            r#"
            SELECT *
            FROM medication_logs
            WHERE user_id = $1
            ORDER BY taken_on DESC, created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(logs.iter().map(LogEntry::from).collect())
    }

    /// Current adherence status of a user.
    pub async fn status(
        pool: &PgPool,
        user_id: &str,
        today: NaiveDate,
    ) -> Result<AdherenceStatus, AppError> {
        let history = Self::entries(pool, user_id).await?;
        Ok(AdherenceCalculator::compute(&history, today))
    }
}
