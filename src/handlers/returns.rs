// src/handlers/returns.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{PermDecideReturns, RequirePermission},
    models::returns::{
        ApproveReturnPayload, CreateReturnPayload, CreatedReturn, ProductReturn, RejectReturnPayload, ReturnFilter,
    },
};

#[utoipa::path(
    get,
    path = "/api/returns",
    tag = "Returns",
    params(ReturnFilter),
    responses(
        (status = 200, description = "Returns, newest first", body = Vec<ProductReturn>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_returns(
    State(app_state): State<AppState>,
    Query(filter): Query<ReturnFilter>,
) -> Result<impl IntoResponse, AppError> {
    let returns = app_state.return_service.list(&filter).await?;
    Ok((StatusCode::OK, Json(returns)))
}

#[utoipa::path(
    post,
    path = "/api/returns",
    tag = "Returns",
    request_body = CreateReturnPayload,
    responses(
        (status = 201, description = "Return requested, pending approval", body = CreatedReturn),
        (status = 400, description = "Item, customer, quantity or window check failed"),
        (status = 404, description = "Unknown order or item")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_return(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateReturnPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let created = app_state.return_service.request(&payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/returns/{id}/approve",
    tag = "Returns",
    params(("id" = i64, Path, description = "Return id")),
    request_body = ApproveReturnPayload,
    responses(
        (status = 200, description = "Return approved, stock credited", body = ProductReturn),
        (status = 404, description = "Unknown return"),
        (status = 409, description = "Return is no longer pending")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_return(
    State(app_state): State<AppState>,
    RequirePermission(user, _): RequirePermission<PermDecideReturns>,
    Path(id): Path<i64>,
    Json(payload): Json<ApproveReturnPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let approved = app_state.return_service.approve(id, &payload, user.id).await?;
    Ok((StatusCode::OK, Json(approved)))
}

#[utoipa::path(
    put,
    path = "/api/returns/{id}/reject",
    tag = "Returns",
    params(("id" = i64, Path, description = "Return id")),
    request_body = RejectReturnPayload,
    responses(
        (status = 200, description = "Return rejected", body = ProductReturn),
        (status = 404, description = "Unknown return"),
        (status = 409, description = "Return is no longer pending")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_return(
    State(app_state): State<AppState>,
    RequirePermission(user, _): RequirePermission<PermDecideReturns>,
    Path(id): Path<i64>,
    payload: Option<Json<RejectReturnPayload>>,
) -> Result<impl IntoResponse, AppError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();

    let rejected = app_state.return_service.reject(id, &payload, user.id).await?;
    Ok((StatusCode::OK, Json(rejected)))
}
