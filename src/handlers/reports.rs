// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    models::dashboard::{DashboardStats, SalesReportQuery, SalesReportRow},
};

#[utoipa::path(
    get,
    path = "/api/reports/dashboard",
    tag = "Reports",
    responses(
        (status = 200, description = "Dashboard cards", body = DashboardStats)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_dashboard(State(app_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(app_state.dashboard_service.stats().await))
}

#[utoipa::path(
    get,
    path = "/api/reports/sales",
    tag = "Reports",
    params(SalesReportQuery),
    responses(
        (status = 200, description = "Completed sales per day, newest first", body = Vec<SalesReportRow>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sales_report(
    State(app_state): State<AppState>,
    Query(query): Query<SalesReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state.dashboard_service.sales_report(&query).await?;
    Ok((StatusCode::OK, Json(rows)))
}
