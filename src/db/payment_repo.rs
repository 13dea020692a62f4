// src/db/payment_repo.rs

use chrono::Utc;
use sqlx::{Executor, QueryBuilder, Sqlite};

use crate::{
    common::{error::AppError, money::Money},
    models::payment::{Payment, PaymentFilter},
};

pub struct NewPayment<'a> {
    pub order_id: i64,
    pub customer_id: i64,
    pub amount: Money,
    pub payment_method: &'a str,
    pub notes: Option<&'a str>,
    pub created_by: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentRepository;

impl PaymentRepository {
    pub async fn insert<'e, E>(&self, executor: E, payment: &NewPayment<'_>) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO payments (order_id, customer_id, amount, payment_method, payment_date, notes, created_by)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            RETURNING id
            "#,
        )
        .bind(payment.order_id)
        .bind(payment.customer_id)
        .bind(payment.amount)
        .bind(payment.payment_method)
        .bind(Utc::now())
        .bind(payment.notes)
        .bind(payment.created_by)
        .fetch_one(executor)
        .await?;
        Ok(id)
    }

    pub async fn list<'e, E>(&self, executor: E, filter: &PaymentFilter) -> Result<Vec<Payment>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT p.*, o.order_number AS order_number, c.name AS customer_name
            FROM payments p
            LEFT JOIN orders o ON o.id = p.order_id
            LEFT JOIN customers c ON c.id = p.customer_id
            WHERE 1=1
            "#,
        );
        if let Some(customer_id) = filter.customer_id {
            query.push(" AND p.customer_id = ").push_bind(customer_id);
        }
        if let Some(order_id) = filter.order_id {
            query.push(" AND p.order_id = ").push_bind(order_id);
        }
        query.push(" ORDER BY p.payment_date DESC, p.id DESC");

        let payments = query.build_query_as::<Payment>().fetch_all(executor).await?;
        Ok(payments)
    }
}
