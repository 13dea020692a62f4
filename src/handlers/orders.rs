// src/handlers/orders.rs

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
    middleware::auth::AuthenticatedUser,
    models::order::{CreateOrderPayload, CreatedOrder, Order, OrderDetail, OrderFilter},
};

#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    params(OrderFilter),
    responses(
        (status = 200, description = "Orders, newest first", body = Vec<Order>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_orders(
    State(app_state): State<AppState>,
    Query(filter): Query<OrderFilter>,
) -> Result<impl IntoResponse, AppError> {
    let orders = app_state.order_service.list(&filter).await?;
    Ok((StatusCode::OK, Json(orders)))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    tag = "Orders",
    params(("id" = i64, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with items and payments", body = OrderDetail),
        (status = 404, description = "Unknown order")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let order = app_state.order_service.get(id).await?;
    Ok((StatusCode::OK, Json(order)))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    tag = "Orders",
    request_body = CreateOrderPayload,
    responses(
        (status = 201, description = "Order placed", body = CreatedOrder),
        (status = 400, description = "Empty or inconsistent order"),
        (status = 404, description = "Unknown customer or product"),
        (status = 409, description = "Insufficient stock")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_order(
    State(app_state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let created = app_state.order_service.create(&payload, user.0.id).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
