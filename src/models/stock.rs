// src/models/stock.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    In,
    Out,
    Adjustment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Sale,
    Return,
    Adjustment,
    Initial,
}

// Append-only ledger row
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct StockMovement {
    pub id: i64,
    pub product_id: i64,
    pub movement_type: MovementType,
    pub quantity: i64,
    pub reference_type: ReferenceType,
    pub reference_id: Option<i64>,
    pub notes: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

/// A movement about to be recorded.
#[derive(Debug, Clone)]
pub struct NewMovement {
    pub product_id: i64,
    pub movement_type: MovementType,
    /// Positive for `in`/`out`, signed for `adjustment`.
    pub quantity: i64,
    pub reference_type: ReferenceType,
    pub reference_id: Option<i64>,
    pub notes: Option<String>,
    pub created_by: i64,
}

impl NewMovement {
    /// Signed effect of this movement on the on-hand quantity.
    pub fn delta(&self) -> i64 {
        match self.movement_type {
            MovementType::In => self.quantity,
            MovementType::Out => -self.quantity,
            MovementType::Adjustment => self.quantity,
        }
    }
}

fn validate_non_zero(val: i64) -> Result<(), ValidationError> {
    if val == 0 {
        let mut err = ValidationError::new("non_zero");
        err.message = Some("Adjustment quantity cannot be zero.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AdjustStockPayload {
    /// Signed delta
    #[validate(custom(function = "validate_non_zero"))]
    pub quantity: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductMovements {
    pub product_id: i64,
    pub cached_stock: i64,
    pub ledger_stock: i64,
    pub movements: Vec<StockMovement>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movement(movement_type: MovementType, quantity: i64) -> NewMovement {
        NewMovement {
            product_id: 1,
            movement_type,
            quantity,
            reference_type: ReferenceType::Adjustment,
            reference_id: None,
            notes: None,
            created_by: 1,
        }
    }

    #[test]
    fn delta_follows_movement_direction() {
        assert_eq!(movement(MovementType::In, 3).delta(), 3);
        assert_eq!(movement(MovementType::Out, 3).delta(), -3);
        assert_eq!(movement(MovementType::Adjustment, -4).delta(), -4);
    }

    #[test]
    fn zero_adjustment_is_invalid() {
        let zero = AdjustStockPayload { quantity: 0, notes: None };
        assert!(zero.validate().is_err());
        let negative = AdjustStockPayload { quantity: -2, notes: None };
        assert!(negative.validate().is_ok());
    }
}
