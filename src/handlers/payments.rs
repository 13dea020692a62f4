// src/handlers/payments.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::payment::{CreatePaymentPayload, Payment, PaymentFilter, RecordedPayment},
};

#[utoipa::path(
    get,
    path = "/api/payments",
    tag = "Payments",
    params(PaymentFilter),
    responses(
        (status = 200, description = "Payments, newest first", body = Vec<Payment>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_payments(
    State(app_state): State<AppState>,
    Query(filter): Query<PaymentFilter>,
) -> Result<impl IntoResponse, AppError> {
    let payments = app_state.payment_service.list(&filter).await?;
    Ok((StatusCode::OK, Json(payments)))
}

#[utoipa::path(
    post,
    path = "/api/payments",
    tag = "Payments",
    request_body = CreatePaymentPayload,
    responses(
        (status = 201, description = "Payment applied to the order", body = RecordedPayment),
        (status = 400, description = "Non-positive amount or customer mismatch"),
        (status = 404, description = "Unknown order"),
        (status = 409, description = "Order is cancelled")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_payment(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreatePaymentPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let recorded = app_state.payment_service.record(&payload, user.0.id).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}
