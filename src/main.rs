// src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Json, Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

#[cfg(test)]
mod test_support;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;
use crate::services::scheduler::{Schedule, Scheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let reminder_daily_at = config.reminder_daily_at;
    let admin_password = config.admin_password.clone();

    let app_state = AppState::new(config).await?;

    db::pool::run_migrations(&app_state.db_pool)
        .await
        .context("failed to run database migrations")?;
    tracing::info!("database migrations applied");

    app_state.auth_service.ensure_admin(admin_password.as_deref()).await?;

    let scheduler = Scheduler::new()
        .add(Schedule::DailyAt(reminder_daily_at), app_state.reminder_service.scan_task())
        .start();

    let app = router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %listener.local_addr()?, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    scheduler.shutdown().await;
    tracing::info!("server stopped");
    Ok(())
}

fn router(app_state: AppState) -> Router {
    // Open to anyone
    let public_routes = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/auth/login", post(handlers::auth::login))
        .route("/docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }));

    // Everything else requires a valid bearer token
    let protected_routes = Router::new()
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::get_me))
        .route(
            "/users",
            get(handlers::auth::list_users).post(handlers::auth::create_user),
        )
        .route(
            "/customers",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route(
            "/customers/{id}",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        .route(
            "/categories",
            get(handlers::catalog::list_categories).post(handlers::catalog::create_category),
        )
        .route(
            "/categories/{id}",
            put(handlers::catalog::update_category).delete(handlers::catalog::delete_category),
        )
        .route(
            "/products",
            get(handlers::catalog::list_products).post(handlers::catalog::create_product),
        )
        .route(
            "/products/{id}",
            get(handlers::catalog::get_product)
                .put(handlers::catalog::update_product)
                .delete(handlers::catalog::delete_product),
        )
        .route("/products/{id}/adjust-stock", post(handlers::catalog::adjust_stock))
        .route("/products/{id}/movements", get(handlers::catalog::list_movements))
        .route(
            "/orders",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route("/orders/{id}", get(handlers::orders::get_order))
        .route(
            "/payments",
            get(handlers::payments::list_payments).post(handlers::payments::create_payment),
        )
        .route(
            "/returns",
            get(handlers::returns::list_returns).post(handlers::returns::create_return),
        )
        .route("/returns/{id}/approve", put(handlers::returns::approve_return))
        .route("/returns/{id}/reject", put(handlers::returns::reject_return))
        .route("/import/customers", post(handlers::imports::import_customers))
        .route("/import/products", post(handlers::imports::import_products))
        .route("/reports/dashboard", get(handlers::reports::get_dashboard))
        .route("/reports/sales", get(handlers::reports::get_sales_report))
        .route(
            "/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .route("/reminders", get(handlers::reminders::list_reminders))
        .route("/reminders/generate", post(handlers::reminders::generate_reminders))
        .route("/reminders/{id}", put(handlers::reminders::update_reminder))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .with_state(app_state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
