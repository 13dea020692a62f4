// src/models/payment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::common::money::Money;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub customer_id: i64,
    #[schema(value_type = f64)]
    pub amount: Money,
    pub payment_method: String,
    pub payment_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_by: i64,

    pub order_number: Option<String>,
    pub customer_name: Option<String>,
}

fn validate_positive(val: &Money) -> Result<(), ValidationError> {
    if !val.is_positive() {
        let mut err = ValidationError::new("range");
        err.message = Some("Amount must be greater than zero.".into());
        return Err(err);
    }
    Ok(())
}

fn default_payment_method() -> String {
    "cash".to_string()
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreatePaymentPayload {
    pub order_id: i64,
    pub customer_id: i64,
    #[validate(custom(function = "validate_positive"))]
    #[schema(value_type = f64)]
    pub amount: Money,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecordedPayment {
    pub id: i64,
    pub order_id: i64,
    #[schema(value_type = f64)]
    pub order_paid_amount: Money,
    #[schema(value_type = f64)]
    pub order_due_amount: Money,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaymentFilter {
    pub customer_id: Option<i64>,
    pub order_id: Option<i64>,
}
