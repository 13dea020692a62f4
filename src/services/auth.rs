// src/services/auth.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{user_repo::NewUser, UserRepository},
    models::auth::{AuthResponse, Claims, CreateUserPayload, Role, User},
};

const SEED_ADMIN_USERNAME: &str = "admin";

#[derive(Clone)]
pub struct AuthService {
    pool: SqlitePool,
    user_repo: UserRepository,
    jwt_secret: Arc<str>,
    token_ttl: TimeDelta,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        pool: SqlitePool,
        user_repo: UserRepository,
        jwt_secret: String,
        token_ttl: TimeDelta,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            pool,
            user_repo,
            jwt_secret: Arc::from(jwt_secret),
            token_ttl,
            bcrypt_cost,
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, AppError> {
        let user = self
            .user_repo
            .find_by_username(&self.pool, username)
            .await?
            .filter(|u| u.active)
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = user.password_hash.clone();

        // bcrypt is CPU bound, keep it off the async workers
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("password verification task failed: {e}"))??;

        if !is_password_valid {
            tracing::info!(username, "rejected login attempt");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.issue_token(&user)?;
        tracing::info!(user_id = user.id, role = user.role.as_str(), "user logged in");

        Ok(AuthResponse { token, user })
    }

    /// Resolves a bearer token to its (active) user.
    pub async fn authenticate(&self, token: &str) -> Result<(User, Claims), AppError> {
        let claims = self.decode_token(token)?;

        if self.user_repo.is_token_revoked(&self.pool, &claims.jti).await? {
            return Err(AppError::InvalidToken);
        }

        let user = self
            .user_repo
            .find_by_id(&self.pool, claims.sub)
            .await?
            .filter(|u| u.active)
            .ok_or(AppError::InvalidToken)?;

        Ok((user, claims))
    }

    /// Revokes the token until its natural expiry.
    pub async fn logout(&self, claims: &Claims) -> Result<(), AppError> {
        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now);
        self.user_repo.revoke_token(&self.pool, &claims.jti, expires_at).await?;

        let purged = self.user_repo.purge_expired_tokens(&self.pool, Utc::now()).await?;
        tracing::info!(user_id = claims.sub, purged, "token revoked");
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.user_repo.list(&self.pool).await
    }

    pub async fn create_user(&self, payload: &CreateUserPayload) -> Result<User, AppError> {
        let password_hash = self.hash_password(payload.password.clone()).await?;

        let user = self
            .user_repo
            .create(
                &self.pool,
                NewUser {
                    username: payload.username.trim(),
                    password_hash: &password_hash,
                    role: payload.role,
                    name: payload.name.trim(),
                    email: payload.email.trim(),
                    phone: payload.phone.as_deref(),
                },
            )
            .await?;

        tracing::info!(user_id = user.id, role = user.role.as_str(), "user created");
        Ok(user)
    }

    /// Seeds the first admin account when the user table is empty.
    ///
    /// Without a configured password a random one is generated and logged once.
    pub async fn ensure_admin(&self, password: Option<&str>) -> Result<Option<User>, AppError> {
        if self.user_repo.count(&self.pool).await? > 0 {
            return Ok(None);
        }

        let password = match password {
            Some(p) => p.to_owned(),
            None => {
                let generated = Uuid::new_v4().simple().to_string();
                tracing::warn!(
                    username = SEED_ADMIN_USERNAME,
                    password = %generated,
                    "ADMIN_PASSWORD not set, generated a password for the initial admin"
                );
                generated
            }
        };
        let password_hash = self.hash_password(password).await?;

        let admin = self
            .user_repo
            .create(
                &self.pool,
                NewUser {
                    username: SEED_ADMIN_USERNAME,
                    password_hash: &password_hash,
                    role: Role::Admin,
                    name: "Administrator",
                    email: "admin@electrastore.com",
                    phone: None,
                },
            )
            .await?;

        tracing::info!(user_id = admin.id, "initial admin account created");
        Ok(Some(admin))
    }

    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let cost = self.bcrypt_cost;
        let hashed = tokio::task::spawn_blocking(move || hash(&password, cost))
            .await
            .map_err(|e| anyhow::anyhow!("password hashing task failed: {e}"))??;
        Ok(hashed)
    }

    pub fn issue_token(&self, user: &User) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?)
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|_| AppError::InvalidToken)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{test_state, TEST_PASSWORD};

    #[tokio::test]
    async fn login_issues_a_token_that_authenticates() {
        let state = test_state().await;
        let auth = &state.auth_service;

        let response = auth.login("admin", TEST_PASSWORD).await.unwrap();
        assert_eq!(response.user.role, Role::Admin);

        let (user, claims) = auth.authenticate(&response.token).await.unwrap();
        assert_eq!(user.id, response.user.id);
        assert_eq!(claims.username, "admin");
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_rejected() {
        let state = test_state().await;
        let auth = &state.auth_service;

        assert!(matches!(
            auth.login("admin", "wrong-password").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody", TEST_PASSWORD).await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn logout_revokes_the_token() {
        let state = test_state().await;
        let auth = &state.auth_service;

        let response = auth.login("admin", TEST_PASSWORD).await.unwrap();
        let (_, claims) = auth.authenticate(&response.token).await.unwrap();
        auth.logout(&claims).await.unwrap();

        assert!(matches!(
            auth.authenticate(&response.token).await,
            Err(AppError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn tampered_or_expired_tokens_are_invalid() {
        let state = test_state().await;
        let auth = &state.auth_service;
        let response = auth.login("admin", TEST_PASSWORD).await.unwrap();

        let mut tampered = response.token.clone();
        tampered.push('x');
        assert!(matches!(auth.decode_token(&tampered), Err(AppError::InvalidToken)));

        let now = Utc::now().timestamp();
        let expired = Claims {
            sub: response.user.id,
            username: "admin".into(),
            role: Role::Admin,
            jti: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &expired,
            &EncodingKey::from_secret(crate::test_support::TEST_JWT_SECRET.as_bytes()),
        )
        .unwrap();
        assert!(matches!(auth.decode_token(&token), Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let state = test_state().await;
        let payload = CreateUserPayload {
            username: "admin".into(),
            password: "secret123".into(),
            role: Role::Cashier,
            name: "Another".into(),
            email: "other@example.com".into(),
            phone: None,
        };
        assert!(matches!(
            state.auth_service.create_user(&payload).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn admin_is_seeded_only_once() {
        let state = test_state().await;
        assert!(state.auth_service.ensure_admin(Some("x")).await.unwrap().is_none());
    }
}
