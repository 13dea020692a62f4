// src/handlers/imports.rs

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use utoipa::ToSchema;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{PermImportData, RequirePermission},
    models::import::ImportReport,
};

/// Multipart body: a single CSV file in the `file` field.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct CsvUpload {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

async fn read_csv_upload(mut multipart: Multipart) -> Result<Vec<u8>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Invalid upload: {e}")))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(AppError::BadRequest("No file uploaded".to_string()))
}

#[utoipa::path(
    post,
    path = "/api/import/customers",
    tag = "Import",
    request_body(content = CsvUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Imported count and per-row errors", body = ImportReport),
        (status = 400, description = "Missing file or no importable rows"),
        (status = 403, description = "Admin or staff only")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_customers(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermImportData>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let data = read_csv_upload(multipart).await?;
    let report = app_state.import_service.import_customers(&data).await?;
    Ok((StatusCode::OK, Json(report)))
}

#[utoipa::path(
    post,
    path = "/api/import/products",
    tag = "Import",
    request_body(content = CsvUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Imported count and per-row errors", body = ImportReport),
        (status = 400, description = "Missing file or no importable rows"),
        (status = 403, description = "Admin or staff only")
    ),
    security(("api_jwt" = []))
)]
pub async fn import_products(
    State(app_state): State<AppState>,
    RequirePermission(user, _): RequirePermission<PermImportData>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let data = read_csv_upload(multipart).await?;
    let report = app_state.import_service.import_products(&data, user.id).await?;
    Ok((StatusCode::OK, Json(report)))
}
