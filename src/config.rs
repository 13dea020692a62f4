// src/config.rs

use std::{env, fmt::Display, str::FromStr, sync::Arc};

use anyhow::Context;
use chrono::{NaiveTime, TimeDelta};
use sqlx::SqlitePool;

use crate::{
    db::{
        pool, CatalogRepository, CustomerRepository, DashboardRepository, OrderRepository,
        PaymentRepository, ReminderRepository, ReturnRepository, SettingsRepository,
        StockRepository, UserRepository,
    },
    services::{
        auth::AuthService, catalog_service::CatalogService, customer_service::CustomerService,
        dashboard_service::DashboardService, import_service::ImportService,
        order_service::OrderService, payment_service::PaymentService,
        reminder_service::ReminderService, return_service::ReturnService,
        settings_service::SettingsService,
    },
};

/// What a sale does when it would take a product's stock below zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OversellPolicy {
    /// Refuse the sale with a conflict.
    #[default]
    Reject,
    /// Accept the sale and let the stock go negative.
    Backorder,
}

impl OversellPolicy {
    pub fn allows_negative_stock(self) -> bool {
        matches!(self, OversellPolicy::Backorder)
    }
}

impl FromStr for OversellPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(OversellPolicy::Reject),
            "backorder" => Ok(OversellPolicy::Backorder),
            other => Err(format!("unknown oversell policy '{other}' (expected reject or backorder)")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub token_ttl: TimeDelta,
    pub bcrypt_cost: u32,
    pub oversell_policy: OversellPolicy,
    pub reminder_daily_at: NaiveTime,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        if jwt_secret.trim().is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let token_ttl_hours: i64 = env_or("TOKEN_TTL_HOURS", 24)?;
        let reminder_daily_at = match env::var("REMINDER_DAILY_AT") {
            Ok(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
                .with_context(|| format!("REMINDER_DAILY_AT must be HH:MM, got '{raw}'"))?,
            Err(_) => NaiveTime::from_hms_opt(9, 0, 0).context("invalid default reminder time")?,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://database/electrastore.db".to_string()),
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            db_max_connections: env_or("DB_MAX_CONNECTIONS", 5)?,
            token_ttl: TimeDelta::try_hours(token_ttl_hours)
                .context("TOKEN_TTL_HOURS is out of range")?,
            bcrypt_cost: env_or("BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            oversell_policy: env_or("OVERSELL_POLICY", OversellPolicy::Reject)?,
            reminder_daily_at,
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
        })
    }
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid value for {key}: {e}")),
        Err(_) => Ok(default),
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Arc<Config>,

    pub auth_service: AuthService,
    pub customer_service: CustomerService,
    pub catalog_service: CatalogService,
    pub order_service: OrderService,
    pub payment_service: PaymentService,
    pub return_service: ReturnService,
    pub reminder_service: ReminderService,
    pub dashboard_service: DashboardService,
    pub settings_service: SettingsService,
    pub import_service: ImportService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = pool::connect(&config.database_url, config.db_max_connections).await?;
        tracing::info!("database connection established");
        Ok(Self::from_pool(db_pool, config))
    }

    /// Builds the service graph on top of an existing pool.
    pub fn from_pool(db_pool: SqlitePool, config: Config) -> Self {
        let config = Arc::new(config);

        let user_repo = UserRepository;
        let customer_repo = CustomerRepository;
        let catalog_repo = CatalogRepository;
        let stock_repo = StockRepository;
        let order_repo = OrderRepository;
        let payment_repo = PaymentRepository;
        let return_repo = ReturnRepository;
        let reminder_repo = ReminderRepository;
        let settings_repo = SettingsRepository;
        let dashboard_repo = DashboardRepository;

        let auth_service = AuthService::new(
            db_pool.clone(),
            user_repo,
            config.jwt_secret.clone(),
            config.token_ttl,
            config.bcrypt_cost,
        );
        let customer_service = CustomerService::new(db_pool.clone(), customer_repo);
        let catalog_service = CatalogService::new(
            db_pool.clone(),
            catalog_repo,
            stock_repo,
            config.oversell_policy,
        );
        let order_service = OrderService::new(
            db_pool.clone(),
            order_repo,
            customer_repo,
            catalog_repo,
            stock_repo,
            payment_repo,
            config.oversell_policy,
        );
        let payment_service = PaymentService::new(
            db_pool.clone(),
            payment_repo,
            order_repo,
            customer_repo,
            reminder_repo,
        );
        let return_service = ReturnService::new(
            db_pool.clone(),
            return_repo,
            order_repo,
            stock_repo,
            settings_repo,
        );
        let reminder_service = ReminderService::new(db_pool.clone(), reminder_repo, settings_repo);
        let dashboard_service = DashboardService::new(db_pool.clone(), dashboard_repo);
        let settings_service = SettingsService::new(db_pool.clone(), settings_repo);
        let import_service =
            ImportService::new(db_pool.clone(), customer_repo, catalog_repo, stock_repo);

        Self {
            db_pool,
            config,
            auth_service,
            customer_service,
            catalog_service,
            order_service,
            payment_service,
            return_service,
            reminder_service,
            dashboard_service,
            settings_service,
            import_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_oversell_policy() {
        assert_eq!("reject".parse::<OversellPolicy>(), Ok(OversellPolicy::Reject));
        assert_eq!(" Backorder ".parse::<OversellPolicy>(), Ok(OversellPolicy::Backorder));
        assert!("sometimes".parse::<OversellPolicy>().is_err());
        assert!(OversellPolicy::Backorder.allows_negative_stock());
        assert!(!OversellPolicy::default().allows_negative_stock());
    }
}
