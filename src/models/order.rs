// src/models/order.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    common::money::Money,
    models::{catalog::validate_not_negative, payment::Payment},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
    Refunded,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub user_id: i64,
    pub order_number: String,
    #[schema(value_type = f64)]
    pub subtotal: Money,
    #[schema(value_type = f64)]
    pub tax_amount: Money,
    #[schema(value_type = f64)]
    pub discount_amount: Money,
    #[schema(value_type = f64)]
    pub total_amount: Money,
    #[schema(value_type = f64)]
    pub paid_amount: Money,
    #[schema(value_type = f64)]
    pub due_amount: Money,
    pub payment_method: Option<String>,
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Joined
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub cashier_name: Option<String>,
}

// Price snapshot taken at sale time
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    #[schema(value_type = f64)]
    pub unit_price: Money,
    #[schema(value_type = f64)]
    pub total_price: Money,
    pub warranty_expiry: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,

    pub product_name: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payments: Vec<Payment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct OrderItemPayload {
    pub product_id: i64,
    #[validate(range(min = 1, message = "Quantity must be greater than zero."))]
    pub quantity: i64,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64)]
    pub unit_price: Money,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64)]
    pub total_price: Money,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateOrderPayload {
    pub customer_id: i64,
    #[validate(length(min = 1, message = "Order must have at least one item."), nested)]
    pub items: Vec<OrderItemPayload>,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64)]
    pub subtotal: Money,
    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64)]
    pub tax_amount: Money,
    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64)]
    pub discount_amount: Money,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64)]
    pub total_amount: Money,
    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64)]
    pub paid_amount: Money,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedOrder {
    pub id: i64,
    pub order_number: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderFilter {
    pub customer_id: Option<i64>,
    pub status: Option<OrderStatus>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
