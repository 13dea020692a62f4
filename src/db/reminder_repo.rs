// src/db/reminder_repo.rs

use chrono::Utc;
use sqlx::{Executor, QueryBuilder, Sqlite};

use crate::{
    common::{error::AppError, money::Money},
    models::reminder::{NewReminder, Reminder, ReminderFilter, ReminderStatus},
};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LowStockCandidate {
    pub id: i64,
    pub name: String,
    pub stock: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentDueCandidate {
    pub id: i64,
    pub order_number: String,
    pub due_amount: Money,
    pub customer_name: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BirthdayCandidate {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReminderRepository;

impl ReminderRepository {
    pub async fn list<'e, E>(&self, executor: E, filter: &ReminderFilter) -> Result<Vec<Reminder>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM reminders WHERE 1=1");
        if let Some(reminder_type) = filter.reminder_type {
            query.push(" AND type = ").push_bind(reminder_type);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        query.push(
            " ORDER BY CASE priority WHEN 'high' THEN 0 WHEN 'medium' THEN 1 ELSE 2 END, created_at DESC, id DESC",
        );

        let reminders = query.build_query_as::<Reminder>().fetch_all(executor).await?;
        Ok(reminders)
    }

    pub async fn update_status<'e, E>(&self, executor: E, id: i64, status: ReminderStatus) -> Result<Option<Reminder>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let reminder = sqlx::query_as::<_, Reminder>(
            "UPDATE reminders SET status = ?1, updated_at = ?2 WHERE id = ?3 RETURNING *",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(reminder)
    }

    /// Inserts unless an active reminder with the same (type, reference) exists.
    /// Returns whether a row was created.
    pub async fn insert_if_absent<'e, E>(&self, executor: E, reminder: &NewReminder) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO reminders (
                type, title, message, reference_id, reference_type, status, priority, due_date, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, 'active', ?6, ?7, ?7, ?7)
            ON CONFLICT (type, reference_id) WHERE status = 'active' DO NOTHING
            "#,
        )
        .bind(reminder.reminder_type)
        .bind(&reminder.title)
        .bind(&reminder.message)
        .bind(reminder.reference_id)
        .bind(reminder.reference_type)
        .bind(reminder.priority)
        .bind(now)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Closes the active payment reminders of a settled order.
    pub async fn complete_payment_reminders<'e, E>(&self, executor: E, order_id: i64) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE reminders SET status = 'completed', updated_at = ?1
            WHERE type = 'payment_due' AND reference_id = ?2 AND status = 'active'
            "#,
        )
        .bind(Utc::now())
        .bind(order_id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    // --- Scan candidates ---

    pub async fn low_stock_candidates<'e, E>(&self, executor: E) -> Result<Vec<LowStockCandidate>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, LowStockCandidate>(
            "SELECT id, name, stock FROM products WHERE active = 1 AND stock <= low_stock_threshold ORDER BY id",
        )
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn payment_due_candidates<'e, E>(&self, executor: E) -> Result<Vec<PaymentDueCandidate>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, PaymentDueCandidate>(
            r#"
            SELECT o.id, o.order_number, o.due_amount, c.name AS customer_name
            FROM orders o
            LEFT JOIN customers c ON c.id = o.customer_id
            WHERE o.status = 'completed' AND o.due_amount > 0
            ORDER BY o.id
            "#,
        )
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// `month_day` is formatted `MM-DD`.
    pub async fn birthday_candidates<'e, E>(&self, executor: E, month_day: &str) -> Result<Vec<BirthdayCandidate>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows = sqlx::query_as::<_, BirthdayCandidate>(
            r#"
            SELECT id, name FROM customers
            WHERE active = 1 AND birthday IS NOT NULL AND strftime('%m-%d', birthday) = ?1
            ORDER BY id
            "#,
        )
        .bind(month_day)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::reminder::{Priority, ReminderType},
        test_support::{count_rows, test_state},
    };

    fn low_stock(reference_id: i64) -> NewReminder {
        NewReminder {
            reminder_type: ReminderType::LowStock,
            title: "Low stock".into(),
            message: "Restock soon".into(),
            reference_id,
            reference_type: "product",
            priority: Priority::High,
        }
    }

    #[tokio::test]
    async fn duplicate_active_reminder_is_skipped() {
        let state = test_state().await;
        let repo = ReminderRepository;

        assert!(repo.insert_if_absent(&state.db_pool, &low_stock(7)).await.unwrap());
        assert!(!repo.insert_if_absent(&state.db_pool, &low_stock(7)).await.unwrap());
        assert!(repo.insert_if_absent(&state.db_pool, &low_stock(8)).await.unwrap());
        assert_eq!(count_rows(&state.db_pool, "reminders").await, 2);
    }
}
