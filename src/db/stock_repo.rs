// src/db/stock_repo.rs

use chrono::Utc;
use sqlx::{Executor, Sqlite, SqliteConnection};

use crate::{
    common::error::AppError,
    models::stock::{NewMovement, StockMovement},
};

/// The stock ledger. `products.stock` is a cache of the signed sum of a
/// product's movements and is only ever changed by `record_movement`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StockRepository;

impl StockRepository {
    /// Applies the movement to the product cache and appends it to the ledger,
    /// inside the caller's transaction.
    ///
    /// The sufficiency check lives in the UPDATE itself, so two concurrent
    /// sales cannot both pass it. With `allow_negative` the stock may drop
    /// below zero.
    pub async fn record_movement(
        &self,
        conn: &mut SqliteConnection,
        movement: &NewMovement,
        allow_negative: bool,
    ) -> Result<StockMovement, AppError> {
        let delta = movement.delta();
        let now = Utc::now();

        let updated = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?1, updated_at = ?2
            WHERE id = ?3 AND (?4 OR stock + ?1 >= 0)
            "#,
        )
        .bind(delta)
        .bind(now)
        .bind(movement.product_id)
        .bind(allow_negative || delta >= 0)
        .execute(&mut *conn)
        .await?;

        if updated.rows_affected() == 0 {
            let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
                .bind(movement.product_id)
                .fetch_optional(&mut *conn)
                .await?;

            return match available {
                None => Err(AppError::NotFound("Product")),
                Some(available) => Err(AppError::Conflict(format!(
                    "Insufficient stock for product {}: {} available, {} requested",
                    movement.product_id,
                    available,
                    -delta
                ))),
            };
        }

        let recorded = sqlx::query_as::<_, StockMovement>(
            r#"
            INSERT INTO stock_movements (
                product_id, movement_type, quantity, reference_type, reference_id, notes, created_by, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING *
            "#,
        )
        .bind(movement.product_id)
        .bind(movement.movement_type)
        .bind(movement.quantity)
        .bind(movement.reference_type)
        .bind(movement.reference_id)
        .bind(&movement.notes)
        .bind(movement.created_by)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        tracing::debug!(
            product_id = movement.product_id,
            movement_type = ?movement.movement_type,
            delta,
            "stock movement recorded"
        );

        Ok(recorded)
    }

    pub async fn list_for_product<'e, E>(&self, executor: E, product_id: i64) -> Result<Vec<StockMovement>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let movements = sqlx::query_as::<_, StockMovement>(
            "SELECT * FROM stock_movements WHERE product_id = ?1 ORDER BY created_at DESC, id DESC",
        )
        .bind(product_id)
        .fetch_all(executor)
        .await?;
        Ok(movements)
    }

    /// On-hand quantity recomputed from the ledger.
    pub async fn ledger_stock<'e, E>(&self, executor: E, product_id: i64) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let stock: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(CASE movement_type
                                    WHEN 'in' THEN quantity
                                    WHEN 'out' THEN -quantity
                                    ELSE quantity
                                END), 0)
            FROM stock_movements
            WHERE product_id = ?1
            "#,
        )
        .bind(product_id)
        .fetch_one(executor)
        .await?;
        Ok(stock)
    }
}
