// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::{
        auth::{AuthenticatedUser, TokenClaims},
        rbac::{PermManageUsers, RequirePermission},
    },
    models::auth::{AuthResponse, CreateUserPayload, LoginPayload, MessageResponse, User},
};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Token issued", body = AuthResponse),
        (status = 400, description = "Invalid payload"),
        (status = 401, description = "Invalid username or password")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let response = app_state
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;

    Ok((StatusCode::OK, Json(response)))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 200, description = "Token revoked", body = MessageResponse),
        (status = 401, description = "Not authenticated")
    ),
    security(("api_jwt" = []))
)]
pub async fn logout(
    State(app_state): State<AppState>,
    TokenClaims(claims): TokenClaims,
) -> Result<impl IntoResponse, AppError> {
    app_state.auth_service.logout(&claims).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("Logged out successfully"))))
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "The authenticated user", body = User),
        (status = 401, description = "Not authenticated")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_me(user: AuthenticatedUser) -> Result<impl IntoResponse, AppError> {
    Ok((StatusCode::OK, Json(user.0)))
}

// ---
// Users (admin only)
// ---

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    responses(
        (status = 200, description = "All users", body = Vec<User>),
        (status = 403, description = "Admin only")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_users(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermManageUsers>,
) -> Result<impl IntoResponse, AppError> {
    let users = app_state.auth_service.list_users().await?;
    Ok((StatusCode::OK, Json(users)))
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "Users",
    request_body = CreateUserPayload,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Username or email already taken")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_user(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermManageUsers>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = app_state.auth_service.create_user(&payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}
