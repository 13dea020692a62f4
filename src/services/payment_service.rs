// src/services/payment_service.rs

use sqlx::SqlitePool;

use crate::{
    common::error::AppError,
    db::{payment_repo::NewPayment, CustomerRepository, OrderRepository, PaymentRepository, ReminderRepository},
    models::{
        order::OrderStatus,
        payment::{CreatePaymentPayload, Payment, PaymentFilter, RecordedPayment},
    },
};

#[derive(Clone)]
pub struct PaymentService {
    pool: SqlitePool,
    payment_repo: PaymentRepository,
    order_repo: OrderRepository,
    customer_repo: CustomerRepository,
    reminder_repo: ReminderRepository,
}

impl PaymentService {
    pub fn new(
        pool: SqlitePool,
        payment_repo: PaymentRepository,
        order_repo: OrderRepository,
        customer_repo: CustomerRepository,
        reminder_repo: ReminderRepository,
    ) -> Self {
        Self { pool, payment_repo, order_repo, customer_repo, reminder_repo }
    }

    pub async fn list(&self, filter: &PaymentFilter) -> Result<Vec<Payment>, AppError> {
        self.payment_repo.list(&self.pool, filter).await
    }

    /// Applies a payment to an order. The due amount is not clamped, so an
    /// overpayment leaves it negative.
    pub async fn record(&self, payload: &CreatePaymentPayload, user_id: i64) -> Result<RecordedPayment, AppError> {
        if !payload.amount.is_positive() {
            return Err(AppError::BadRequest("Payment amount must be greater than zero".into()));
        }

        let mut tx = self.pool.begin().await?;

        let order = self
            .order_repo
            .find_by_id(&mut *tx, payload.order_id)
            .await?
            .ok_or(AppError::NotFound("Order"))?;

        if order.customer_id != payload.customer_id {
            return Err(AppError::BadRequest("Customer does not match the order".into()));
        }
        if order.status == OrderStatus::Cancelled {
            return Err(AppError::Conflict(format!(
                "Order {} is cancelled and cannot receive payments",
                order.order_number
            )));
        }

        // 1. Payment row
        let payment_id = self
            .payment_repo
            .insert(
                &mut *tx,
                &NewPayment {
                    order_id: order.id,
                    customer_id: order.customer_id,
                    amount: payload.amount,
                    payment_method: &payload.payment_method,
                    notes: payload.notes.as_deref(),
                    created_by: user_id,
                },
            )
            .await?;

        // 2. Order balances
        let (paid, due) = self.order_repo.apply_payment(&mut *tx, order.id, payload.amount).await?;

        // 3. Customer caches
        self.customer_repo.recompute_totals(&mut *tx, order.customer_id).await?;

        // 4. A settled order no longer needs chasing
        if !due.is_positive() {
            self.reminder_repo.complete_payment_reminders(&mut *tx, order.id).await?;
        }

        tx.commit().await?;

        tracing::info!(
            payment_id,
            order_id = order.id,
            amount = %payload.amount,
            due = %due,
            "payment recorded"
        );

        Ok(RecordedPayment {
            id: payment_id,
            order_id: order.id,
            order_paid_amount: paid,
            order_due_amount: due,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::money::Money,
        models::{
            order::{CreateOrderPayload, OrderItemPayload},
            reminder::{ReminderFilter, ReminderStatus, ReminderType},
        },
        test_support::{count_rows, seed_customer, seed_product, test_state, ADMIN_ID},
    };

    fn m(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    fn payment(order_id: i64, customer_id: i64, cents: i64) -> CreatePaymentPayload {
        CreatePaymentPayload {
            order_id,
            customer_id,
            amount: m(cents),
            payment_method: "cash".into(),
            notes: None,
        }
    }

    /// 2 x 10.00 + 1.00 tax, 10.00 paid up front
    async fn open_order(state: &crate::config::AppState) -> (i64, i64) {
        let customer = seed_customer(state, "Joe").await;
        let product = seed_product(state, "Headset", 1_000, 10).await;
        let payload = CreateOrderPayload {
            customer_id: customer.id,
            items: vec![OrderItemPayload {
                product_id: product.id,
                quantity: 2,
                unit_price: m(1_000),
                total_price: m(2_000),
            }],
            subtotal: m(2_000),
            tax_amount: m(100),
            discount_amount: Money::ZERO,
            total_amount: m(2_100),
            paid_amount: m(1_000),
            payment_method: None,
            notes: None,
        };
        let created = state.order_service.create(&payload, ADMIN_ID).await.unwrap();
        (created.id, customer.id)
    }

    #[tokio::test]
    async fn settling_the_balance_zeroes_order_and_customer_due() {
        let state = test_state().await;
        let (order_id, customer_id) = open_order(&state).await;
        assert_eq!(state.customer_service.get(customer_id).await.unwrap().due_amount, m(1_100));

        let recorded = state
            .payment_service
            .record(&payment(order_id, customer_id, 1_100), ADMIN_ID)
            .await
            .unwrap();
        assert_eq!(recorded.order_paid_amount, m(2_100));
        assert_eq!(recorded.order_due_amount, Money::ZERO);

        let customer = state.customer_service.get(customer_id).await.unwrap();
        assert_eq!(customer.due_amount, Money::ZERO);
        assert_eq!(customer.paid_amount, m(2_100));

        let payments = state
            .payment_service
            .list(&PaymentFilter { customer_id: Some(customer_id), order_id: None })
            .await
            .unwrap();
        let total: Money = payments.iter().map(|p| p.amount).sum();
        assert_eq!(total, recorded.order_paid_amount);
    }

    #[tokio::test]
    async fn overpayment_is_not_clamped() {
        let state = test_state().await;
        let (order_id, customer_id) = open_order(&state).await;

        let recorded = state
            .payment_service
            .record(&payment(order_id, customer_id, 1_500), ADMIN_ID)
            .await
            .unwrap();
        assert_eq!(recorded.order_due_amount, m(-400));
    }

    #[tokio::test]
    async fn guards_reject_bad_payments_without_side_effects() {
        let state = test_state().await;
        let (order_id, customer_id) = open_order(&state).await;
        let payments_before = count_rows(&state.db_pool, "payments").await;

        assert!(matches!(
            state.payment_service.record(&payment(9_999, customer_id, 100), ADMIN_ID).await,
            Err(AppError::NotFound("Order"))
        ));
        assert!(matches!(
            state.payment_service.record(&payment(order_id, customer_id + 1, 100), ADMIN_ID).await,
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            state.payment_service.record(&payment(order_id, customer_id, 0), ADMIN_ID).await,
            Err(AppError::BadRequest(_))
        ));

        sqlx::query("UPDATE orders SET status = 'cancelled' WHERE id = ?1")
            .bind(order_id)
            .execute(&state.db_pool)
            .await
            .unwrap();
        assert!(matches!(
            state.payment_service.record(&payment(order_id, customer_id, 100), ADMIN_ID).await,
            Err(AppError::Conflict(_))
        ));

        assert_eq!(count_rows(&state.db_pool, "payments").await, payments_before);
    }

    #[tokio::test]
    async fn settling_completes_active_payment_reminders() {
        let state = test_state().await;
        let (order_id, customer_id) = open_order(&state).await;

        let report = state.reminder_service.generate().await.unwrap();
        assert_eq!(report.payment_due, 1);

        state
            .payment_service
            .record(&payment(order_id, customer_id, 1_100), ADMIN_ID)
            .await
            .unwrap();

        let reminders = state
            .reminder_service
            .list(&ReminderFilter { reminder_type: Some(ReminderType::PaymentDue), status: None })
            .await
            .unwrap();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].status, ReminderStatus::Completed);
    }
}
