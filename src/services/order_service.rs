// src/services/order_service.rs

use std::sync::Arc;

use chrono::{Months, NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::{
    common::{error::AppError, money::Money},
    config::OversellPolicy,
    db::{
        order_repo::{NewOrder, NewOrderItem},
        payment_repo::NewPayment,
        CatalogRepository, CustomerRepository, OrderRepository, PaymentRepository, StockRepository,
    },
    models::{
        order::{CreateOrderPayload, CreatedOrder, Order, OrderDetail, OrderFilter, OrderStatus},
        payment::PaymentFilter,
        stock::{MovementType, NewMovement, ReferenceType},
    },
};

/// Produces candidate order numbers. Swappable so collisions can be forced.
pub type OrderNumberGenerator = Arc<dyn Fn() -> String + Send + Sync>;

const ORDER_NUMBER_ATTEMPTS: usize = 5;
const DEFAULT_PAYMENT_METHOD: &str = "cash";

/// `ORD-<unix millis>-<5 uppercase alphanumerics>`
pub fn generate_order_number() -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(5)
        .collect::<String>()
        .to_ascii_uppercase();
    format!("ORD-{}-{}", Utc::now().timestamp_millis(), suffix)
}

/// Checks the order arithmetic before anything touches the database.
pub fn validate_order(payload: &CreateOrderPayload) -> Result<(), AppError> {
    if payload.items.is_empty() {
        return Err(AppError::BadRequest("Order must have at least one item".into()));
    }
    if let Some(item) = payload.items.iter().find(|i| i.quantity <= 0) {
        return Err(AppError::BadRequest(format!(
            "Quantity for product {} must be greater than zero",
            item.product_id
        )));
    }

    let money_fields = [
        payload.subtotal,
        payload.tax_amount,
        payload.discount_amount,
        payload.total_amount,
        payload.paid_amount,
    ];
    let item_money = payload.items.iter().flat_map(|i| [i.unit_price, i.total_price]);
    if money_fields.into_iter().chain(item_money).any(Money::is_negative) {
        return Err(AppError::BadRequest("Amounts cannot be negative".into()));
    }

    let overflow = || AppError::BadRequest("Order amounts are out of range".into());

    let items_sum = payload
        .items
        .iter()
        .try_fold(Money::ZERO, |sum, i| sum.checked_add(i.total_price))
        .ok_or_else(overflow)?;
    if items_sum != payload.subtotal {
        return Err(AppError::BadRequest(format!(
            "Subtotal {} does not match the sum of the items ({})",
            payload.subtotal, items_sum
        )));
    }

    let expected_total = payload
        .subtotal
        .checked_add(payload.tax_amount)
        .and_then(|m| m.checked_sub(payload.discount_amount))
        .ok_or_else(overflow)?;
    if expected_total != payload.total_amount {
        return Err(AppError::BadRequest(format!(
            "Total {} does not match subtotal + tax - discount ({})",
            payload.total_amount, expected_total
        )));
    }

    Ok(())
}

/// Today plus the product's warranty, when it has one.
pub fn warranty_expiry(sold_on: NaiveDate, warranty_months: i64) -> Option<NaiveDate> {
    if warranty_months <= 0 {
        return None;
    }
    let months = u32::try_from(warranty_months).ok()?;
    sold_on.checked_add_months(Months::new(months))
}

#[derive(Clone)]
pub struct OrderService {
    pool: SqlitePool,
    order_repo: OrderRepository,
    customer_repo: CustomerRepository,
    catalog_repo: CatalogRepository,
    stock_repo: StockRepository,
    payment_repo: PaymentRepository,
    oversell_policy: OversellPolicy,
    order_numbers: OrderNumberGenerator,
}

impl OrderService {
    pub fn new(
        pool: SqlitePool,
        order_repo: OrderRepository,
        customer_repo: CustomerRepository,
        catalog_repo: CatalogRepository,
        stock_repo: StockRepository,
        payment_repo: PaymentRepository,
        oversell_policy: OversellPolicy,
    ) -> Self {
        Self {
            pool,
            order_repo,
            customer_repo,
            catalog_repo,
            stock_repo,
            payment_repo,
            oversell_policy,
            order_numbers: Arc::new(generate_order_number),
        }
    }

    pub fn with_order_numbers(mut self, generator: OrderNumberGenerator) -> Self {
        self.order_numbers = generator;
        self
    }

    pub async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, AppError> {
        self.order_repo.list(&self.pool, filter).await
    }

    pub async fn get(&self, id: i64) -> Result<OrderDetail, AppError> {
        let order = self
            .order_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("Order"))?;
        let items = self.order_repo.items_for_order(&self.pool, id).await?;
        let payments = self
            .payment_repo
            .list(&self.pool, &PaymentFilter { customer_id: None, order_id: Some(id) })
            .await?;

        Ok(OrderDetail { order, items, payments })
    }

    /// Creates the order, its items, their stock movements, the up-front
    /// payment and the customer's new totals in one transaction.
    pub async fn create(&self, payload: &CreateOrderPayload, user_id: i64) -> Result<CreatedOrder, AppError> {
        // 1. Arithmetic checks
        validate_order(payload)?;

        // 2. Everything below commits or rolls back together
        let mut tx = self.pool.begin().await?;

        let customer = self
            .customer_repo
            .find_by_id(&mut *tx, payload.customer_id)
            .await?
            .filter(|c| c.active)
            .ok_or(AppError::NotFound("Customer"))?;

        // 3. Order header with a unique number
        let payment_method = payload.payment_method.as_deref().filter(|m| !m.is_empty());
        let due_amount = payload.total_amount - payload.paid_amount;
        let (order_id, order_number) = self
            .insert_order(&mut tx, payload, user_id, payment_method, due_amount)
            .await?;

        // 4. Items and their stock movements
        let today = Utc::now().date_naive();
        for item in &payload.items {
            let product = self
                .catalog_repo
                .find_product(&mut *tx, item.product_id)
                .await?
                .filter(|p| p.active)
                .ok_or(AppError::NotFound("Product"))?;

            self.order_repo
                .insert_item(
                    &mut *tx,
                    &NewOrderItem {
                        order_id,
                        product_id: product.id,
                        quantity: item.quantity,
                        unit_price: item.unit_price,
                        total_price: item.total_price,
                        warranty_expiry: warranty_expiry(today, product.warranty_months),
                    },
                )
                .await?;

            let movement = NewMovement {
                product_id: product.id,
                movement_type: MovementType::Out,
                quantity: item.quantity,
                reference_type: ReferenceType::Sale,
                reference_id: Some(order_id),
                notes: Some(format!("Sale {order_number}")),
                created_by: user_id,
            };
            self.stock_repo
                .record_movement(&mut tx, &movement, self.oversell_policy.allows_negative_stock())
                .await?;
        }

        // 5. Up-front payment
        if payload.paid_amount.is_positive() {
            self.payment_repo
                .insert(
                    &mut *tx,
                    &NewPayment {
                        order_id,
                        customer_id: customer.id,
                        amount: payload.paid_amount,
                        payment_method: payment_method.unwrap_or(DEFAULT_PAYMENT_METHOD),
                        notes: Some("Payment at order creation"),
                        created_by: user_id,
                    },
                )
                .await?;
        }

        // 6. Customer caches
        self.customer_repo.recompute_totals(&mut *tx, customer.id).await?;

        tx.commit().await?;

        tracing::info!(
            order_id,
            order_number = %order_number,
            customer_id = customer.id,
            total = %payload.total_amount,
            due = %due_amount,
            "order created"
        );

        Ok(CreatedOrder { id: order_id, order_number })
    }

    /// Inserts the order header, drawing a new number on each collision.
    async fn insert_order(
        &self,
        conn: &mut SqliteConnection,
        payload: &CreateOrderPayload,
        user_id: i64,
        payment_method: Option<&str>,
        due_amount: Money,
    ) -> Result<(i64, String), AppError> {
        for attempt in 1..=ORDER_NUMBER_ATTEMPTS {
            let order_number = (self.order_numbers)();
            let new_order = NewOrder {
                customer_id: payload.customer_id,
                user_id,
                order_number: &order_number,
                subtotal: payload.subtotal,
                tax_amount: payload.tax_amount,
                discount_amount: payload.discount_amount,
                total_amount: payload.total_amount,
                paid_amount: payload.paid_amount,
                due_amount,
                payment_method,
                status: OrderStatus::Completed,
                notes: payload.notes.as_deref(),
            };

            match self.order_repo.insert_order(&mut *conn, &new_order).await {
                Ok(id) => return Ok((id, order_number)),
                Err(e) if is_unique_violation(&e) => {
                    tracing::warn!(attempt, order_number = %order_number, "order number collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(anyhow::anyhow!("could not allocate a unique order number after {ORDER_NUMBER_ATTEMPTS} attempts").into())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error().is_some_and(|db| db.is_unique_violation())
}
