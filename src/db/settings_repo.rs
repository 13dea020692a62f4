// src/db/settings_repo.rs

use chrono::Utc;
use sqlx::{Executor, Sqlite};

use crate::{common::error::AppError, models::settings::SettingsMap};

#[derive(Debug, Clone, Copy, Default)]
pub struct SettingsRepository;

impl SettingsRepository {
    pub async fn get_all<'e, E>(&self, executor: E) -> Result<SettingsMap, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings ORDER BY key")
            .fetch_all(executor)
            .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn upsert<'e, E>(&self, executor: E, key: &str, value: &str) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(executor)
        .await?;
        Ok(())
    }
}
