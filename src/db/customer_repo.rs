// src/db/customer_repo.rs

use chrono::Utc;
use sqlx::{Executor, QueryBuilder, Sqlite};

use crate::{
    common::error::{conflict_on_unique, AppError},
    models::customer::{Customer, CustomerFilter, CustomerPayload},
};

#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerRepository;

impl CustomerRepository {
    pub async fn list<'e, E>(&self, executor: E, filter: &CustomerFilter) -> Result<Vec<Customer>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM customers WHERE 1=1");

        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let pattern = format!("%{search}%");
            query
                .push(" AND (name LIKE ")
                .push_bind(pattern.clone())
                .push(" OR phone LIKE ")
                .push_bind(pattern.clone())
                .push(" OR email LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(active) = filter.active {
            query.push(" AND active = ").push_bind(active);
        }
        query.push(" ORDER BY name ASC");

        let customers = query.build_query_as::<Customer>().fetch_all(executor).await?;
        Ok(customers)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let customer = sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ?1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(customer)
    }

    pub async fn create<'e, E>(&self, executor: E, payload: &CustomerPayload) -> Result<Customer, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now();
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (name, email, phone, address, city, state, zip_code, birthday, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(payload.email.as_deref().filter(|e| !e.is_empty()))
        .bind(&payload.phone)
        .bind(&payload.address)
        .bind(&payload.city)
        .bind(&payload.state)
        .bind(&payload.zip_code)
        .bind(payload.birthday)
        .bind(now)
        .fetch_one(executor)
        .await
        .map_err(|e| conflict_on_unique(e, "A customer with this email already exists"))
    }

    pub async fn update<'e, E>(&self, executor: E, id: i64, payload: &CustomerPayload) -> Result<Option<Customer>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = ?1, email = ?2, phone = ?3, address = ?4, city = ?5, state = ?6,
                zip_code = ?7, birthday = ?8, updated_at = ?9
            WHERE id = ?10
            RETURNING *
            "#,
        )
        .bind(&payload.name)
        .bind(payload.email.as_deref().filter(|e| !e.is_empty()))
        .bind(&payload.phone)
        .bind(&payload.address)
        .bind(&payload.city)
        .bind(&payload.state)
        .bind(&payload.zip_code)
        .bind(payload.birthday)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(|e| conflict_on_unique(e, "A customer with this email already exists"))
    }

    /// Returns false when no such customer exists.
    pub async fn deactivate<'e, E>(&self, executor: E, id: i64) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE customers SET active = 0, updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Recomputes the cached totals from the customer's non-cancelled orders.
    pub async fn recompute_totals<'e, E>(&self, executor: E, customer_id: i64) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            UPDATE customers SET
                total_amount = (SELECT COALESCE(SUM(total_amount), 0) FROM orders
                                WHERE customer_id = ?1 AND status != 'cancelled'),
                paid_amount  = (SELECT COALESCE(SUM(paid_amount), 0) FROM orders
                                WHERE customer_id = ?1 AND status != 'cancelled'),
                due_amount   = (SELECT COALESCE(SUM(due_amount), 0) FROM orders
                                WHERE customer_id = ?1 AND status != 'cancelled'),
                updated_at   = ?2
            WHERE id = ?1
            "#,
        )
        .bind(customer_id)
        .bind(Utc::now())
        .execute(executor)
        .await?;
        Ok(())
    }
}
