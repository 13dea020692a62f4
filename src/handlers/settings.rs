// src/handlers/settings.rs

use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::Value;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{PermUpdateSettings, RequirePermission},
};

#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "Settings",
    responses(
        (status = 200, description = "Every setting as a key/value map", body = BTreeMap<String, String>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_settings(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let settings = app_state.settings_service.get_all().await?;
    Ok((StatusCode::OK, Json(settings)))
}

#[utoipa::path(
    put,
    path = "/api/settings",
    tag = "Settings",
    request_body = BTreeMap<String, String>,
    responses(
        (status = 200, description = "Settings after the update", body = BTreeMap<String, String>),
        (status = 400, description = "Empty update"),
        (status = 403, description = "Admin only")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_settings(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermUpdateSettings>,
    Json(changes): Json<BTreeMap<String, Value>>,
) -> Result<impl IntoResponse, AppError> {
    let settings = app_state.settings_service.update(changes).await?;
    Ok((StatusCode::OK, Json(settings)))
}
