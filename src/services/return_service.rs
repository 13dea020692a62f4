// src/services/return_service.rs

use chrono::{DateTime, TimeDelta, Utc};
use sqlx::SqlitePool;

use crate::{
    common::error::AppError,
    db::{OrderRepository, ReturnRepository, SettingsRepository, StockRepository},
    models::{
        order::OrderStatus,
        returns::{
            ApproveReturnPayload, CreateReturnPayload, CreatedReturn, ProductReturn, RejectReturnPayload,
            ReturnFilter, ReturnStatus,
        },
        settings::StoreSettings,
        stock::{MovementType, NewMovement, ReferenceType},
    },
};

/// Whether a return requested at `now` is still inside the policy window.
pub fn within_return_window(ordered_at: DateTime<Utc>, now: DateTime<Utc>, return_days: i64) -> bool {
    match TimeDelta::try_days(return_days).and_then(|w| ordered_at.checked_add_signed(w)) {
        Some(deadline) => now <= deadline,
        None => true,
    }
}

#[derive(Clone)]
pub struct ReturnService {
    pool: SqlitePool,
    return_repo: ReturnRepository,
    order_repo: OrderRepository,
    stock_repo: StockRepository,
    settings_repo: SettingsRepository,
}

impl ReturnService {
    pub fn new(
        pool: SqlitePool,
        return_repo: ReturnRepository,
        order_repo: OrderRepository,
        stock_repo: StockRepository,
        settings_repo: SettingsRepository,
    ) -> Self {
        Self { pool, return_repo, order_repo, stock_repo, settings_repo }
    }

    pub async fn list(&self, filter: &ReturnFilter) -> Result<Vec<ProductReturn>, AppError> {
        self.return_repo.list(&self.pool, filter).await
    }

    pub async fn get(&self, id: i64) -> Result<ProductReturn, AppError> {
        self.return_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("Return"))
    }

    /// Files a pending return. Stock and balances stay untouched until approval.
    pub async fn request(&self, payload: &CreateReturnPayload) -> Result<CreatedReturn, AppError> {
        if payload.quantity <= 0 {
            return Err(AppError::BadRequest("Return quantity must be greater than zero".into()));
        }

        let mut tx = self.pool.begin().await?;

        let order = self
            .order_repo
            .find_by_id(&mut *tx, payload.order_id)
            .await?
            .ok_or(AppError::NotFound("Order"))?;
        let item = self
            .order_repo
            .find_item(&mut *tx, payload.order_item_id)
            .await?
            .ok_or(AppError::NotFound("Order item"))?;

        if item.order_id != order.id {
            return Err(AppError::BadRequest("Item does not belong to this order".into()));
        }
        if order.customer_id != payload.customer_id {
            return Err(AppError::BadRequest("Customer does not match the order".into()));
        }
        if order.status == OrderStatus::Cancelled {
            return Err(AppError::Conflict("Cancelled orders cannot be returned".into()));
        }

        let already_open = self.return_repo.open_quantity_for_item(&mut *tx, item.id).await?;
        if payload.quantity > item.quantity - already_open {
            return Err(AppError::BadRequest(format!(
                "Cannot return {} unit(s): {} sold, {} already returned or pending",
                payload.quantity, item.quantity, already_open
            )));
        }

        let settings = StoreSettings::from(&self.settings_repo.get_all(&mut *tx).await?);
        if !within_return_window(order.created_at, Utc::now(), settings.return_days) {
            return Err(AppError::BadRequest(format!(
                "The {}-day return window for order {} has expired",
                settings.return_days, order.order_number
            )));
        }

        let id = self.return_repo.insert(&mut *tx, payload).await?;
        tx.commit().await?;

        tracing::info!(return_id = id, order_id = order.id, quantity = payload.quantity, "return requested");
        Ok(CreatedReturn { id, status: ReturnStatus::Pending })
    }

    /// pending -> approved, crediting the returned units back to stock.
    pub async fn approve(&self, id: i64, payload: &ApproveReturnPayload, user_id: i64) -> Result<ProductReturn, AppError> {
        if payload.refund_amount.is_negative() {
            return Err(AppError::BadRequest("Refund amount cannot be negative".into()));
        }

        let mut tx = self.pool.begin().await?;

        let record = self
            .return_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Return"))?;
        ensure_pending(&record)?;

        let item = self
            .order_repo
            .find_item(&mut *tx, record.order_item_id)
            .await?
            .ok_or(AppError::NotFound("Order item"))?;

        let transitioned = self
            .return_repo
            .mark_approved(&mut *tx, id, payload.refund_amount, user_id, payload.notes.as_deref())
            .await?;
        if !transitioned {
            return Err(AppError::Conflict(format!("Return {id} is no longer pending")));
        }

        let movement = NewMovement {
            product_id: item.product_id,
            movement_type: MovementType::In,
            quantity: record.quantity,
            reference_type: ReferenceType::Return,
            reference_id: Some(id),
            notes: Some(format!("Return #{id}")),
            created_by: user_id,
        };
        self.stock_repo.record_movement(&mut tx, &movement, true).await?;

        tx.commit().await?;

        tracing::info!(
            return_id = id,
            product_id = item.product_id,
            quantity = record.quantity,
            refund = %payload.refund_amount,
            "return approved"
        );
        self.get(id).await
    }

    /// pending -> rejected. No stock or balance effect.
    pub async fn reject(&self, id: i64, payload: &RejectReturnPayload, user_id: i64) -> Result<ProductReturn, AppError> {
        let mut tx = self.pool.begin().await?;

        let record = self
            .return_repo
            .find_by_id(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Return"))?;
        ensure_pending(&record)?;

        if !self
            .return_repo
            .mark_rejected(&mut *tx, id, user_id, payload.notes.as_deref())
            .await?
        {
            return Err(AppError::Conflict(format!("Return {id} is no longer pending")));
        }

        tx.commit().await?;
        tracing::info!(return_id = id, "return rejected");
        self.get(id).await
    }
}

fn ensure_pending(record: &ProductReturn) -> Result<(), AppError> {
    if record.status != ReturnStatus::Pending {
        return Err(AppError::Conflict(format!(
            "Return {} is already {}",
            record.id,
            record.status.as_str()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::money::Money,
        config::AppState,
        models::order::{CreateOrderPayload, OrderItemPayload},
        test_support::{count_rows, seed_customer, seed_product, test_state, ADMIN_ID},
    };

    struct Sale {
        order_id: i64,
        item_id: i64,
        customer_id: i64,
        product_id: i64,
    }

    /// Sells 2 units at 10.00 from a stock of 10.
    async fn sale(state: &AppState) -> Sale {
        let customer = seed_customer(state, "Kim").await;
        let product = seed_product(state, "Smartwatch", 1_000, 10).await;
        let payload = CreateOrderPayload {
            customer_id: customer.id,
            items: vec![OrderItemPayload {
                product_id: product.id,
                quantity: 2,
                unit_price: Money::from_cents(1_000),
                total_price: Money::from_cents(2_000),
            }],
            subtotal: Money::from_cents(2_000),
            tax_amount: Money::from_cents(100),
            discount_amount: Money::ZERO,
            total_amount: Money::from_cents(2_100),
            paid_amount: Money::from_cents(2_100),
            payment_method: None,
            notes: None,
        };
        let created = state.order_service.create(&payload, ADMIN_ID).await.unwrap();
        let detail = state.order_service.get(created.id).await.unwrap();
        Sale {
            order_id: created.id,
            item_id: detail.items[0].id,
            customer_id: customer.id,
            product_id: product.id,
        }
    }

    fn request(sale: &Sale, quantity: i64) -> CreateReturnPayload {
        CreateReturnPayload {
            order_id: sale.order_id,
            order_item_id: sale.item_id,
            customer_id: sale.customer_id,
            reason: "Defective".into(),
            quantity,
            notes: None,
        }
    }

    fn approval(cents: i64) -> ApproveReturnPayload {
        ApproveReturnPayload { refund_amount: Money::from_cents(cents), notes: None }
    }

    #[tokio::test]
    async fn approval_credits_stock_through_the_ledger() {
        let state = test_state().await;
        let sale = sale(&state).await;
        assert_eq!(state.catalog_service.get_product(sale.product_id).await.unwrap().stock, 8);

        let created = state.return_service.request(&request(&sale, 1)).await.unwrap();
        assert_eq!(created.status, ReturnStatus::Pending);
        // Requesting alone changes nothing
        assert_eq!(state.catalog_service.get_product(sale.product_id).await.unwrap().stock, 8);

        let approved = state
            .return_service
            .approve(created.id, &approval(1_000), ADMIN_ID)
            .await
            .unwrap();
        assert_eq!(approved.status, ReturnStatus::Approved);
        assert_eq!(approved.refund_amount, Some(Money::from_cents(1_000)));
        assert_eq!(approved.approved_by, Some(ADMIN_ID));

        let ledger = state.catalog_service.movements(sale.product_id).await.unwrap();
        assert_eq!(ledger.cached_stock, 9);
        assert_eq!(ledger.ledger_stock, 9);
        let returns: Vec<_> = ledger
            .movements
            .iter()
            .filter(|mv| mv.reference_type == ReferenceType::Return)
            .collect();
        assert_eq!(returns.len(), 1);
        assert_eq!(returns[0].movement_type, MovementType::In);
        assert_eq!(returns[0].reference_id, Some(created.id));
    }

    #[tokio::test]
    async fn second_approval_is_a_conflict_and_does_not_double_credit() {
        let state = test_state().await;
        let sale = sale(&state).await;
        let created = state.return_service.request(&request(&sale, 1)).await.unwrap();

        state.return_service.approve(created.id, &approval(1_000), ADMIN_ID).await.unwrap();
        let movements = count_rows(&state.db_pool, "stock_movements").await;

        let again = state.return_service.approve(created.id, &approval(1_000), ADMIN_ID).await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
        assert_eq!(count_rows(&state.db_pool, "stock_movements").await, movements);
        assert_eq!(state.catalog_service.get_product(sale.product_id).await.unwrap().stock, 9);
    }

    #[tokio::test]
    async fn rejected_returns_cannot_be_approved() {
        let state = test_state().await;
        let sale = sale(&state).await;
        let created = state.return_service.request(&request(&sale, 2)).await.unwrap();

        let rejected = state
            .return_service
            .reject(created.id, &RejectReturnPayload::default(), ADMIN_ID)
            .await
            .unwrap();
        assert_eq!(rejected.status, ReturnStatus::Rejected);

        assert!(matches!(
            state.return_service.approve(created.id, &approval(0), ADMIN_ID).await,
            Err(AppError::Conflict(_))
        ));
        assert_eq!(state.catalog_service.get_product(sale.product_id).await.unwrap().stock, 8);
    }

    #[tokio::test]
    async fn request_validation() {
        let state = test_state().await;
        let sale = sale(&state).await;

        assert!(matches!(
            state.return_service.request(&request(&sale, 3)).await,
            Err(AppError::BadRequest(_))
        ));

        let mut wrong_customer = request(&sale, 1);
        wrong_customer.customer_id += 100;
        assert!(matches!(
            state.return_service.request(&wrong_customer).await,
            Err(AppError::BadRequest(_))
        ));

        let mut unknown_item = request(&sale, 1);
        unknown_item.order_item_id = 9_999;
        assert!(matches!(
            state.return_service.request(&unknown_item).await,
            Err(AppError::NotFound(_))
        ));

        // Two pending units already cover the whole item
        state.return_service.request(&request(&sale, 2)).await.unwrap();
        assert!(matches!(
            state.return_service.request(&request(&sale, 1)).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn oversized_quantity_is_refused_without_overflow() {
        let state = test_state().await;
        let sale = sale(&state).await;

        state.return_service.request(&request(&sale, 1)).await.unwrap();
        assert!(matches!(
            state.return_service.request(&request(&sale, i64::MAX)).await,
            Err(AppError::BadRequest(_))
        ));
        assert_eq!(count_rows(&state.db_pool, "returns").await, 1);
    }

    #[tokio::test]
    async fn requests_outside_the_window_are_refused() {
        let state = test_state().await;
        let sale = sale(&state).await;

        sqlx::query("UPDATE orders SET created_at = datetime('now', '-30 days') WHERE id = ?1")
            .bind(sale.order_id)
            .execute(&state.db_pool)
            .await
            .unwrap();

        assert!(matches!(
            state.return_service.request(&request(&sale, 1)).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn window_boundaries() {
        let ordered = Utc::now() - TimeDelta::days(7);
        assert!(within_return_window(ordered, ordered + TimeDelta::days(7), 7));
        assert!(!within_return_window(ordered, ordered + TimeDelta::days(8), 7));
    }
}
