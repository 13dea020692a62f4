// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::error::AppError,
    config::AppState,
    models::auth::{Claims, User},
};

/// Resolves the bearer token into the calling user. Missing, malformed,
/// expired or revoked tokens all stop here with 401.
pub async fn auth_guard(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::InvalidToken)?;

    let (user, claims) = app_state.auth_service.authenticate(bearer.token()).await?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

// Extractor for the user resolved by the guard
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

/// Claims of the presented token, needed to revoke it on logout.
#[derive(Debug, Clone)]
pub struct TokenClaims(pub Claims);

impl<S> FromRequestParts<S> for TokenClaims
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(TokenClaims)
            .ok_or(AppError::InvalidToken)
    }
}
