// src/models/dashboard.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::common::money::Money;

// Cards shown on the dashboard. Every field falls back to zero on its own.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_customers: i64,
    pub total_products: i64,
    pub total_orders: i64,
    #[schema(value_type = f64)]
    pub total_sales: Money,
    #[schema(value_type = f64)]
    pub total_paid: Money,
    #[schema(value_type = f64)]
    pub total_due: Money,
    #[schema(value_type = f64)]
    pub today_sales: Money,
    pub today_orders: i64,
    pub low_stock_products: i64,
    pub pending_returns: i64,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct SalesReportRow {
    /// YYYY-MM-DD
    pub date: String,
    pub total_orders: i64,
    #[schema(value_type = f64)]
    pub total_sales: Money,
    #[schema(value_type = f64)]
    pub total_paid: Money,
    #[schema(value_type = f64)]
    pub total_due: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    Today,
    Week,
    Month,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SalesReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub period: Option<ReportPeriod>,
}
