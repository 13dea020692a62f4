// src/db/return_repo.rs

use chrono::Utc;
use sqlx::{Executor, QueryBuilder, Sqlite};

use crate::{
    common::{error::AppError, money::Money},
    models::returns::{CreateReturnPayload, ProductReturn, ReturnFilter, ReturnStatus},
};

const RETURN_SELECT: &str = r#"
    SELECT r.*, c.name AS customer_name, o.order_number AS order_number,
           p.name AS product_name, u.name AS approved_by_name
    FROM returns r
    LEFT JOIN customers c ON c.id = r.customer_id
    LEFT JOIN orders o ON o.id = r.order_id
    LEFT JOIN order_items oi ON oi.id = r.order_item_id
    LEFT JOIN products p ON p.id = oi.product_id
    LEFT JOIN users u ON u.id = r.approved_by
"#;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnRepository;

impl ReturnRepository {
    pub async fn insert<'e, E>(&self, executor: E, payload: &CreateReturnPayload) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO returns (order_id, order_item_id, customer_id, reason, status, quantity, notes, return_date)
            VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?6, ?7)
            RETURNING id
            "#,
        )
        .bind(payload.order_id)
        .bind(payload.order_item_id)
        .bind(payload.customer_id)
        .bind(&payload.reason)
        .bind(payload.quantity)
        .bind(&payload.notes)
        .bind(Utc::now())
        .fetch_one(executor)
        .await?;
        Ok(id)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Option<ProductReturn>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{RETURN_SELECT} WHERE r.id = ?1");
        let record = sqlx::query_as::<_, ProductReturn>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(record)
    }

    pub async fn list<'e, E>(&self, executor: E, filter: &ReturnFilter) -> Result<Vec<ProductReturn>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut query = QueryBuilder::<Sqlite>::new(RETURN_SELECT);
        query.push(" WHERE 1=1");
        if let Some(status) = filter.status {
            query.push(" AND r.status = ").push_bind(status);
        }
        if let Some(customer_id) = filter.customer_id {
            query.push(" AND r.customer_id = ").push_bind(customer_id);
        }
        query.push(" ORDER BY r.return_date DESC, r.id DESC");

        let returns = query.build_query_as::<ProductReturn>().fetch_all(executor).await?;
        Ok(returns)
    }

    /// Quantity of an order item already returned or awaiting a decision.
    pub async fn open_quantity_for_item<'e, E>(&self, executor: E, order_item_id: i64) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let quantity: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM returns WHERE order_item_id = ?1 AND status != 'rejected'",
        )
        .bind(order_item_id)
        .fetch_one(executor)
        .await?;
        Ok(quantity)
    }

    /// Moves a pending return to `approved`. Returns false when the return is
    /// not pending anymore, which leaves the row untouched.
    pub async fn mark_approved<'e, E>(
        &self,
        executor: E,
        id: i64,
        refund_amount: Money,
        approved_by: i64,
        notes: Option<&str>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE returns
            SET status = 'approved', refund_amount = ?1, approved_by = ?2, approved_date = ?3,
                notes = COALESCE(?4, notes)
            WHERE id = ?5 AND status = 'pending'
            "#,
        )
        .bind(refund_amount)
        .bind(approved_by)
        .bind(Utc::now())
        .bind(notes)
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn mark_rejected<'e, E>(
        &self,
        executor: E,
        id: i64,
        rejected_by: i64,
        notes: Option<&str>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE returns
            SET status = ?1, approved_by = ?2, approved_date = ?3, notes = COALESCE(?4, notes)
            WHERE id = ?5 AND status = 'pending'
            "#,
        )
        .bind(ReturnStatus::Rejected)
        .bind(rejected_by)
        .bind(Utc::now())
        .bind(notes)
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
