//! Medication log and adherence status routes.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use uuid::Uuid;

use okusuri_common::error::AppError;
use okusuri_common::types::MedicationLog;
use okusuri_engine::adherence::MedicationStatus;
use okusuri_engine::medication::{MedicationService, RegisterLogParams, UpdateLogParams};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/medication-status", get(get_status))
        .route(
            "/api/medication-log",
            get(list_logs).post(register_log),
        )
        .route(
            "/api/medication-log/{id}",
            get(get_log).patch(update_log),
        )
}

/// GET /api/medication-status: Current streak / rest period for the caller.
async fn get_status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<MedicationStatus>, AppError> {
    let status =
        MedicationService::status(&state.pool, &auth.user_id, state.clock.today()).await?;
    Ok(Json(status.into()))
}

/// POST /api/medication-log: Record today's (or a given day's) dose.
async fn register_log(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(params): Json<RegisterLogParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    let log =
        MedicationService::register(&state.pool, &auth.user_id, &params, state.clock.today())
            .await?;
    Ok(Json(json!({
        "success": true,
        "message": "medication log registered successfully",
        "log": log,
    })))
}

/// GET /api/medication-log: All of the caller's logs, newest first.
async fn list_logs(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<MedicationLog>>, AppError> {
    let logs = MedicationService::list_by_user(&state.pool, &auth.user_id).await?;
    Ok(Json(logs))
}

/// GET /api/medication-log/{id}: One of the caller's logs.
async fn get_log(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<MedicationLog>, AppError> {
    let log = MedicationService::get(&state.pool, &auth.user_id, id).await?;
    Ok(Json(log))
}

/// PATCH /api/medication-log/{id}: Update the bleeding flag of a log.
async fn update_log(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(params): Json<UpdateLogParams>,
) -> Result<Json<MedicationLog>, AppError> {
    let log = MedicationService::update(&state.pool, &auth.user_id, id, &params).await?;
    Ok(Json(log))
}
