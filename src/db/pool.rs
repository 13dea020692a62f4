// src/db/pool.rs

use std::{path::Path, str::FromStr, time::Duration};

use anyhow::Context;
use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};

/// Opens the SQLite pool: WAL journal, foreign keys on, bounded busy wait.
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .with_context(|| format!("invalid DATABASE_URL '{database_url}'"))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    ensure_parent_dir(options.get_filename()).await?;

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect_with(options)
        .await
        .context("failed to open the database")?;

    Ok(pool)
}

async fn ensure_parent_dir(filename: &Path) -> anyhow::Result<()> {
    if filename.as_os_str() == ":memory:" {
        return Ok(());
    }
    if let Some(parent) = filename.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("cannot create database directory {}", parent.display()))?;
    }
    Ok(())
}

/// Applies the embedded migrations (schema, default categories and settings).
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), MigrateError> {
    sqlx::migrate!().run(pool).await
}
