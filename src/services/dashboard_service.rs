// src/services/dashboard_service.rs

use chrono::{NaiveDate, TimeDelta, Utc};
use sqlx::SqlitePool;

use crate::{
    common::{error::AppError, money::Money},
    db::{dashboard_repo::Aggregate, DashboardRepository},
    models::dashboard::{DashboardStats, ReportPeriod, SalesReportQuery, SalesReportRow},
};

#[derive(Clone)]
pub struct DashboardService {
    pool: SqlitePool,
    repo: DashboardRepository,
}

impl DashboardService {
    pub fn new(pool: SqlitePool, repo: DashboardRepository) -> Self {
        Self { pool, repo }
    }

    /// Each card is computed on its own; a failing query leaves its card at zero.
    pub async fn stats(&self) -> DashboardStats {
        DashboardStats {
            total_customers: self.card(Aggregate::TotalCustomers).await,
            total_products: self.card(Aggregate::TotalProducts).await,
            total_orders: self.card(Aggregate::TotalOrders).await,
            total_sales: Money::from_cents(self.card(Aggregate::TotalSales).await),
            total_paid: Money::from_cents(self.card(Aggregate::TotalPaid).await),
            total_due: Money::from_cents(self.card(Aggregate::TotalDue).await),
            today_sales: Money::from_cents(self.card(Aggregate::TodaySales).await),
            today_orders: self.card(Aggregate::TodayOrders).await,
            low_stock_products: self.card(Aggregate::LowStockProducts).await,
            pending_returns: self.card(Aggregate::PendingReturns).await,
        }
    }

    async fn card(&self, aggregate: Aggregate) -> i64 {
        match self.repo.aggregate(&self.pool, aggregate).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(?aggregate, error = %e, "dashboard card failed, reporting zero");
                0
            }
        }
    }

    pub async fn sales_report(&self, query: &SalesReportQuery) -> Result<Vec<SalesReportRow>, AppError> {
        let (start, end) = resolve_range(query, Utc::now().date_naive());
        self.repo.sales_by_day(&self.pool, start, end).await
    }
}

/// A named period wins over explicit dates. Week and month are rolling
/// windows ending today.
pub fn resolve_range(query: &SalesReportQuery, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
    match query.period {
        Some(ReportPeriod::Today) => (Some(today), Some(today)),
        Some(ReportPeriod::Week) => (Some(today - TimeDelta::days(7)), Some(today)),
        Some(ReportPeriod::Month) => (Some(today - TimeDelta::days(30)), Some(today)),
        None => (query.start_date, query.end_date),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_customer, seed_order, seed_product, test_state};

    #[tokio::test]
    async fn empty_store_reports_zeroes() {
        let state = test_state().await;
        let stats = state.dashboard_service.stats().await;

        assert_eq!(stats.total_orders, 0);
        assert_eq!(stats.total_sales, Money::ZERO);
        assert_eq!(stats.pending_returns, 0);
    }

    #[tokio::test]
    async fn cards_follow_completed_orders() {
        let state = test_state().await;
        let customer = seed_customer(&state, "Dana").await;
        let product = seed_product(&state, "Router", 2_500, 12).await;
        seed_order(&state, customer.id, product.id, 2, 2_500, 3_000).await;

        let stats = state.dashboard_service.stats().await;
        assert_eq!(stats.total_customers, 1);
        assert_eq!(stats.total_products, 1);
        assert_eq!(stats.total_orders, 1);
        assert_eq!(stats.total_sales, Money::from_cents(5_000));
        assert_eq!(stats.total_paid, Money::from_cents(3_000));
        assert_eq!(stats.total_due, Money::from_cents(2_000));
        assert_eq!(stats.today_orders, 1);
        assert_eq!(stats.today_sales, Money::from_cents(5_000));
        // 12 - 2 = 10, at the threshold
        assert_eq!(stats.low_stock_products, 1);
    }

    #[tokio::test]
    async fn failing_card_reports_zero_and_keeps_the_rest() {
        let state = test_state().await;
        let customer = seed_customer(&state, "Fern").await;
        let product = seed_product(&state, "Tablet", 4_000, 20).await;
        seed_order(&state, customer.id, product.id, 1, 4_000, 4_000).await;

        sqlx::query("DROP TABLE returns").execute(&state.db_pool).await.unwrap();

        let stats = state.dashboard_service.stats().await;
        assert_eq!(stats.pending_returns, 0);
        assert_eq!(stats.total_customers, 1);
        assert_eq!(stats.total_orders, 1);
        assert_eq!(stats.total_sales, Money::from_cents(4_000));
    }

    #[tokio::test]
    async fn sales_report_groups_by_day() {
        let state = test_state().await;
        let customer = seed_customer(&state, "Eli").await;
        let product = seed_product(&state, "Mouse", 1_500, 50).await;
        seed_order(&state, customer.id, product.id, 1, 1_500, 1_500).await;
        seed_order(&state, customer.id, product.id, 2, 1_500, 0).await;

        let rows = state
            .dashboard_service
            .sales_report(&SalesReportQuery { period: Some(ReportPeriod::Today), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, Utc::now().date_naive().to_string());
        assert_eq!(rows[0].total_orders, 2);
        assert_eq!(rows[0].total_sales, Money::from_cents(4_500));
        assert_eq!(rows[0].total_due, Money::from_cents(3_000));
    }

    #[test]
    fn named_period_overrides_dates() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
        let query = SalesReportQuery {
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1),
            end_date: None,
            period: Some(ReportPeriod::Week),
        };
        assert_eq!(
            resolve_range(&query, today),
            (NaiveDate::from_ymd_opt(2025, 3, 24), Some(today))
        );

        let explicit = SalesReportQuery { start_date: Some(today), ..Default::default() };
        assert_eq!(resolve_range(&explicit, today), (Some(today), None));
    }
}
