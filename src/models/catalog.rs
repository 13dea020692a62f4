// src/models/catalog.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::common::money::Money;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryPayload {
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
    #[schema(value_type = f64)]
    pub price: Money,
    #[schema(value_type = Option<f64>)]
    pub cost_price: Option<Money>,
    /// Cache of the stock ledger
    pub stock: i64,
    pub low_stock_threshold: i64,
    pub warranty_months: i64,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub image_url: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Joined from categories
    pub category_name: Option<String>,
    pub category_icon: Option<String>,
}

pub(crate) fn validate_not_negative(val: &Money) -> Result<(), ValidationError> {
    if val.is_negative() {
        let mut err = ValidationError::new("range");
        err.message = Some("Amount cannot be negative.".into());
        return Err(err);
    }
    Ok(())
}

fn default_low_stock_threshold() -> i64 {
    10
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductPayload {
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,
    pub category_id: i64,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64)]
    pub price: Money,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub cost_price: Option<Money>,
    /// Opening stock, recorded as an initial movement
    #[serde(default)]
    #[validate(range(min = 0, message = "Stock cannot be negative."))]
    pub stock: i64,
    #[serde(default = "default_low_stock_threshold")]
    #[validate(range(min = 0))]
    pub low_stock_threshold: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub warranty_months: i64,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateProductPayload {
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,
    pub category_id: i64,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = f64)]
    pub price: Money,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(value_type = Option<f64>)]
    pub cost_price: Option<Money>,
    /// Target on-hand quantity; the difference is booked as an adjustment
    #[validate(range(min = 0, message = "Stock cannot be negative."))]
    pub stock: Option<i64>,
    #[serde(default = "default_low_stock_threshold")]
    #[validate(range(min = 0))]
    pub low_stock_threshold: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub warranty_months: i64,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    /// Category name
    pub category: Option<String>,
    pub low_stock: Option<bool>,
}
