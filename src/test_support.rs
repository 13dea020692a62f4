// src/test_support.rs
//
// Shared fixtures for the in-memory database tests.

use std::str::FromStr;

use chrono::{NaiveTime, TimeDelta};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::{
    common::money::Money,
    config::{AppState, Config, OversellPolicy},
    db::pool::run_migrations,
    models::{
        catalog::{CreateProductPayload, Product},
        customer::{Customer, CustomerPayload},
        order::{CreateOrderPayload, CreatedOrder, OrderItemPayload},
    },
};

pub const TEST_JWT_SECRET: &str = "test-secret";
pub const TEST_PASSWORD: &str = "admin-password";
/// Id of the seeded admin account.
pub const ADMIN_ID: i64 = 1;
/// Id of the first default category.
pub const CATEGORY_ID: i64 = 1;

/// Single-connection in-memory database with the schema applied. The one
/// connection is kept alive for the whole test, so it never loses its data.
pub async fn test_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        db_max_connections: 1,
        token_ttl: TimeDelta::hours(24),
        bcrypt_cost: 4,
        oversell_policy: OversellPolicy::Reject,
        reminder_daily_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        admin_password: Some(TEST_PASSWORD.to_string()),
    }
}

pub async fn test_state() -> AppState {
    test_state_with(OversellPolicy::Reject).await
}

pub async fn test_state_with(policy: OversellPolicy) -> AppState {
    let mut config = test_config();
    config.oversell_policy = policy;
    let state = AppState::from_pool(test_pool().await, config);
    state
        .auth_service
        .ensure_admin(Some(TEST_PASSWORD))
        .await
        .unwrap();
    state
}

pub async fn seed_customer(state: &AppState, name: &str) -> Customer {
    let payload = CustomerPayload {
        name: name.to_string(),
        phone: "555-0100".to_string(),
        ..Default::default()
    };
    state.customer_service.create(&payload).await.unwrap()
}

pub async fn seed_product(state: &AppState, name: &str, price_cents: i64, stock: i64) -> Product {
    seed_product_with_warranty(state, name, price_cents, stock, 0).await
}

pub async fn seed_product_with_warranty(
    state: &AppState,
    name: &str,
    price_cents: i64,
    stock: i64,
    warranty_months: i64,
) -> Product {
    let payload = CreateProductPayload {
        name: name.to_string(),
        category_id: CATEGORY_ID,
        price: Money::from_cents(price_cents),
        cost_price: None,
        stock,
        low_stock_threshold: 10,
        warranty_months,
        description: None,
        brand: None,
        model: None,
        image_url: None,
    };
    state
        .catalog_service
        .create_product(&payload, ADMIN_ID)
        .await
        .unwrap()
}

/// Single-line, tax-free order placed by the admin.
pub async fn seed_order(
    state: &AppState,
    customer_id: i64,
    product_id: i64,
    quantity: i64,
    unit_cents: i64,
    paid_cents: i64,
) -> CreatedOrder {
    let total = Money::from_cents(unit_cents) * quantity;
    let payload = CreateOrderPayload {
        customer_id,
        items: vec![OrderItemPayload {
            product_id,
            quantity,
            unit_price: Money::from_cents(unit_cents),
            total_price: total,
        }],
        subtotal: total,
        tax_amount: Money::ZERO,
        discount_amount: Money::ZERO,
        total_amount: total,
        paid_amount: Money::from_cents(paid_cents),
        payment_method: None,
        notes: None,
    };
    state.order_service.create(&payload, ADMIN_ID).await.unwrap()
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
        .unwrap()
}
