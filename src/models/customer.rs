// src/models/customer.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::common::money::Money;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,

    // Caches over the customer's non-cancelled orders
    #[schema(value_type = f64)]
    pub total_amount: Money,
    #[schema(value_type = f64)]
    pub paid_amount: Money,
    #[schema(value_type = f64)]
    pub due_amount: Money,

    pub active: bool,
    pub birthday: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of both create and update; an update replaces every contact field.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CustomerPayload {
    #[validate(length(min = 1, message = "Name is required."))]
    pub name: String,
    #[validate(email(message = "Invalid email address."))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "Phone is required."))]
    pub phone: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub birthday: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CustomerFilter {
    /// Matches name, phone or email
    pub search: Option<String>,
    pub active: Option<bool>,
}
