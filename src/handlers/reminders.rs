// src/handlers/reminders.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{PermGenerateReminders, RequirePermission},
    models::reminder::{GenerationReport, Reminder, ReminderFilter, UpdateReminderPayload},
};

#[utoipa::path(
    get,
    path = "/api/reminders",
    tag = "Reminders",
    params(ReminderFilter),
    responses(
        (status = 200, description = "Reminders by priority, newest first", body = Vec<Reminder>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_reminders(
    State(app_state): State<AppState>,
    Query(filter): Query<ReminderFilter>,
) -> Result<impl IntoResponse, AppError> {
    let reminders = app_state.reminder_service.list(&filter).await?;
    Ok((StatusCode::OK, Json(reminders)))
}

#[utoipa::path(
    put,
    path = "/api/reminders/{id}",
    tag = "Reminders",
    params(("id" = i64, Path, description = "Reminder id")),
    request_body = UpdateReminderPayload,
    responses(
        (status = 200, description = "Reminder updated", body = Reminder),
        (status = 404, description = "Unknown reminder")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_reminder(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateReminderPayload>,
) -> Result<impl IntoResponse, AppError> {
    let reminder = app_state.reminder_service.update_status(id, payload.status).await?;
    Ok((StatusCode::OK, Json(reminder)))
}

#[utoipa::path(
    post,
    path = "/api/reminders/generate",
    tag = "Reminders",
    responses(
        (status = 200, description = "Reminders created by this scan", body = GenerationReport),
        (status = 403, description = "Admin only")
    ),
    security(("api_jwt" = []))
)]
pub async fn generate_reminders(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermGenerateReminders>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.reminder_service.generate().await?;
    Ok((StatusCode::OK, Json(report)))
}
