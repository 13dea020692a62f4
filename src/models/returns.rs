// src/models/returns.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{common::money::Money, models::catalog::validate_not_negative};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReturnStatus {
    Pending,
    Approved,
    Rejected,
}

impl ReturnStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReturnStatus::Pending => "pending",
            ReturnStatus::Approved => "approved",
            ReturnStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct ProductReturn {
    pub id: i64,
    pub order_id: i64,
    pub order_item_id: i64,
    pub customer_id: i64,
    pub reason: String,
    pub status: ReturnStatus,
    pub quantity: i64,
    #[schema(value_type = Option<f64>)]
    pub refund_amount: Option<Money>,
    pub notes: Option<String>,
    pub return_date: DateTime<Utc>,
    pub approved_by: Option<i64>,
    pub approved_date: Option<DateTime<Utc>>,

    // Joined
    pub customer_name: Option<String>,
    pub order_number: Option<String>,
    pub product_name: Option<String>,
    pub approved_by_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateReturnPayload {
    pub order_id: i64,
    pub order_item_id: i64,
    pub customer_id: i64,
    #[validate(length(min = 1, message = "A reason is required."))]
    pub reason: String,
    #[validate(range(min = 1, message = "Quantity must be greater than zero."))]
    pub quantity: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ApproveReturnPayload {
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64)]
    pub refund_amount: Money,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RejectReturnPayload {
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedReturn {
    pub id: i64,
    pub status: ReturnStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReturnFilter {
    pub status: Option<ReturnStatus>,
    pub customer_id: Option<i64>,
}
