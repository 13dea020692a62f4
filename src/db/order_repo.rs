// src/db/order_repo.rs

use chrono::{NaiveDate, Utc};
use sqlx::{Executor, QueryBuilder, Sqlite};

use crate::{
    common::{error::AppError, money::Money},
    models::order::{Order, OrderFilter, OrderItem, OrderStatus},
};

const ORDER_SELECT: &str = r#"
    SELECT o.*, c.name AS customer_name, c.phone AS customer_phone, u.name AS cashier_name
    FROM orders o
    LEFT JOIN customers c ON c.id = o.customer_id
    LEFT JOIN users u ON u.id = o.user_id
"#;

const ITEM_SELECT: &str = r#"
    SELECT oi.*, p.name AS product_name, p.brand AS brand, p.model AS model
    FROM order_items oi
    LEFT JOIN products p ON p.id = oi.product_id
"#;

pub struct NewOrder<'a> {
    pub customer_id: i64,
    pub user_id: i64,
    pub order_number: &'a str,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub discount_amount: Money,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub due_amount: Money,
    pub payment_method: Option<&'a str>,
    pub status: OrderStatus,
    pub notes: Option<&'a str>,
}

pub struct NewOrderItem {
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
    pub warranty_expiry: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OrderRepository;

impl OrderRepository {
    /// Returns the raw driver error so the caller can tell an order number
    /// collision apart from other failures.
    pub async fn insert_order<'e, E>(&self, executor: E, order: &NewOrder<'_>) -> Result<i64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now();
        sqlx::query_scalar(
            r#"
            INSERT INTO orders (
                customer_id, user_id, order_number, subtotal, tax_amount, discount_amount,
                total_amount, paid_amount, due_amount, payment_method, status, notes,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
            RETURNING id
            "#,
        )
        .bind(order.customer_id)
        .bind(order.user_id)
        .bind(order.order_number)
        .bind(order.subtotal)
        .bind(order.tax_amount)
        .bind(order.discount_amount)
        .bind(order.total_amount)
        .bind(order.paid_amount)
        .bind(order.due_amount)
        .bind(order.payment_method)
        .bind(order.status)
        .bind(order.notes)
        .bind(now)
        .fetch_one(executor)
        .await
    }

    pub async fn insert_item<'e, E>(&self, executor: E, item: &NewOrderItem) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO order_items (order_id, product_id, quantity, unit_price, total_price, warranty_expiry, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id
            "#,
        )
        .bind(item.order_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total_price)
        .bind(item.warranty_expiry)
        .bind(Utc::now())
        .fetch_one(executor)
        .await?;
        Ok(id)
    }

    pub async fn list<'e, E>(&self, executor: E, filter: &OrderFilter) -> Result<Vec<Order>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut query = QueryBuilder::<Sqlite>::new(ORDER_SELECT);
        query.push(" WHERE 1=1");

        if let Some(customer_id) = filter.customer_id {
            query.push(" AND o.customer_id = ").push_bind(customer_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND o.status = ").push_bind(status);
        }
        if let Some(start) = filter.start_date {
            query.push(" AND date(o.created_at) >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            query.push(" AND date(o.created_at) <= ").push_bind(end);
        }
        query.push(" ORDER BY o.created_at DESC, o.id DESC");

        let orders = query.build_query_as::<Order>().fetch_all(executor).await?;
        Ok(orders)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{ORDER_SELECT} WHERE o.id = ?1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(order)
    }

    pub async fn items_for_order<'e, E>(&self, executor: E, order_id: i64) -> Result<Vec<OrderItem>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{ITEM_SELECT} WHERE oi.order_id = ?1 ORDER BY oi.id ASC");
        let items = sqlx::query_as::<_, OrderItem>(&sql)
            .bind(order_id)
            .fetch_all(executor)
            .await?;
        Ok(items)
    }

    pub async fn find_item<'e, E>(&self, executor: E, item_id: i64) -> Result<Option<OrderItem>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{ITEM_SELECT} WHERE oi.id = ?1");
        let item = sqlx::query_as::<_, OrderItem>(&sql)
            .bind(item_id)
            .fetch_optional(executor)
            .await?;
        Ok(item)
    }

    /// Adds `amount` to paid and takes it off due. Returns the new (paid, due).
    pub async fn apply_payment<'e, E>(&self, executor: E, order_id: i64, amount: Money) -> Result<(Money, Money), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let balances: (Money, Money) = sqlx::query_as(
            r#"
            UPDATE orders
            SET paid_amount = paid_amount + ?1, due_amount = due_amount - ?1, updated_at = ?2
            WHERE id = ?3
            RETURNING paid_amount, due_amount
            "#,
        )
        .bind(amount)
        .bind(Utc::now())
        .bind(order_id)
        .fetch_one(executor)
        .await?;
        Ok(balances)
    }
}
