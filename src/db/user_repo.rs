// src/db/user_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

use crate::{
    common::error::{conflict_on_unique, AppError},
    models::auth::{Role, User},
};

// Users and revoked tokens
#[derive(Debug, Clone, Copy, Default)]
pub struct UserRepository;

pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub role: Role,
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
}

impl UserRepository {
    pub async fn find_by_username<'e, E>(&self, executor: E, username: &str) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: i64) -> Result<Option<User>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    pub async fn list<'e, E>(&self, executor: E) -> Result<Vec<User>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY name ASC")
            .fetch_all(executor)
            .await?;
        Ok(users)
    }

    pub async fn count<'e, E>(&self, executor: E) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(executor)
            .await?;
        Ok(count)
    }

    pub async fn create<'e, E>(&self, executor: E, new_user: NewUser<'_>) -> Result<User, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now();
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, role, name, email, phone, active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
            RETURNING *
            "#,
        )
        .bind(new_user.username)
        .bind(new_user.password_hash)
        .bind(new_user.role)
        .bind(new_user.name)
        .bind(new_user.email)
        .bind(new_user.phone)
        .bind(now)
        .fetch_one(executor)
        .await
        .map_err(|e| conflict_on_unique(e, "Username or email already exists"))
    }

    // --- Token revocation ---

    pub async fn revoke_token<'e, E>(&self, executor: E, jti: &str, expires_at: DateTime<Utc>) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query("INSERT OR IGNORE INTO revoked_tokens (jti, expires_at) VALUES (?1, ?2)")
            .bind(jti)
            .bind(expires_at)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn is_token_revoked<'e, E>(&self, executor: E, jti: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let revoked: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM revoked_tokens WHERE jti = ?1)")
            .bind(jti)
            .fetch_one(executor)
            .await?;
        Ok(revoked)
    }

    pub async fn purge_expired_tokens<'e, E>(&self, executor: E, now: DateTime<Utc>) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < ?1")
            .bind(now)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }
}
