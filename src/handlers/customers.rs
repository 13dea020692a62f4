// src/handlers/customers.rs

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
    middleware::rbac::{PermDeleteCustomer, RequirePermission},
    models::{
        auth::MessageResponse,
        customer::{Customer, CustomerFilter, CustomerPayload},
    },
};

#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    params(CustomerFilter),
    responses(
        (status = 200, description = "Customers ordered by name", body = Vec<Customer>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    Query(filter): Query<CustomerFilter>,
) -> Result<impl IntoResponse, AppError> {
    let customers = app_state.customer_service.list(&filter).await?;
    Ok((StatusCode::OK, Json(customers)))
}

#[utoipa::path(
    get,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = i64, Path, description = "Customer id")),
    responses(
        (status = 200, description = "The customer", body = Customer),
        (status = 404, description = "Unknown customer")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let customer = app_state.customer_service.get(id).await?;
    Ok((StatusCode::OK, Json(customer)))
}

#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = CustomerPayload,
    responses(
        (status = 201, description = "Customer created", body = Customer),
        (status = 400, description = "Invalid payload"),
        (status = 409, description = "Email already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let customer = app_state.customer_service.create(&payload).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

#[utoipa::path(
    put,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = i64, Path, description = "Customer id")),
    request_body = CustomerPayload,
    responses(
        (status = 200, description = "Customer updated", body = Customer),
        (status = 404, description = "Unknown customer"),
        (status = 409, description = "Email already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<CustomerPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let customer = app_state.customer_service.update(id, &payload).await?;
    Ok((StatusCode::OK, Json(customer)))
}

#[utoipa::path(
    delete,
    path = "/api/customers/{id}",
    tag = "Customers",
    params(("id" = i64, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer deactivated", body = MessageResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Unknown customer")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermDeleteCustomer>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.customer_service.deactivate(id).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("Customer deleted successfully"))))
}
