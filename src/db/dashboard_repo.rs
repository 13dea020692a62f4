// src/db/dashboard_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, QueryBuilder, Sqlite};

use crate::{
    common::error::AppError,
    models::dashboard::SalesReportRow,
};

/// One dashboard card: how to compute it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    TotalCustomers,
    TotalProducts,
    TotalOrders,
    TotalSales,
    TotalPaid,
    TotalDue,
    TodaySales,
    TodayOrders,
    LowStockProducts,
    PendingReturns,
}

impl Aggregate {
    fn sql(self) -> &'static str {
        match self {
            Aggregate::TotalCustomers => "SELECT COUNT(*) FROM customers WHERE active = 1",
            Aggregate::TotalProducts => "SELECT COUNT(*) FROM products WHERE active = 1",
            Aggregate::TotalOrders => "SELECT COUNT(*) FROM orders WHERE status = 'completed'",
            Aggregate::TotalSales => {
                "SELECT COALESCE(SUM(total_amount), 0) FROM orders WHERE status = 'completed'"
            }
            Aggregate::TotalPaid => {
                "SELECT COALESCE(SUM(paid_amount), 0) FROM orders WHERE status = 'completed'"
            }
            Aggregate::TotalDue => {
                "SELECT COALESCE(SUM(due_amount), 0) FROM orders WHERE status = 'completed'"
            }
            Aggregate::TodaySales => {
                "SELECT COALESCE(SUM(total_amount), 0) FROM orders
                 WHERE status = 'completed' AND date(created_at) = date('now')"
            }
            Aggregate::TodayOrders => {
                "SELECT COUNT(*) FROM orders WHERE status = 'completed' AND date(created_at) = date('now')"
            }
            Aggregate::LowStockProducts => {
                "SELECT COUNT(*) FROM products WHERE active = 1 AND stock <= low_stock_threshold"
            }
            Aggregate::PendingReturns => "SELECT COUNT(*) FROM returns WHERE status = 'pending'",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DashboardRepository;

impl DashboardRepository {
    /// Counts and cent sums are both plain integers in SQLite.
    pub async fn aggregate<'e, E>(&self, executor: E, aggregate: Aggregate) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let value: i64 = sqlx::query_scalar(aggregate.sql()).fetch_one(executor).await?;
        Ok(value)
    }

    pub async fn sales_by_day<'e, E>(
        &self,
        executor: E,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<SalesReportRow>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut query = QueryBuilder::<Sqlite>::new(
            r#"
            SELECT date(o.created_at) AS date,
                   COUNT(*) AS total_orders,
                   COALESCE(SUM(o.total_amount), 0) AS total_sales,
                   COALESCE(SUM(o.paid_amount), 0) AS total_paid,
                   COALESCE(SUM(o.due_amount), 0) AS total_due
            FROM orders o
            WHERE o.status = 'completed'
            "#,
        );
        if let Some(start) = start {
            query.push(" AND date(o.created_at) >= ").push_bind(start);
        }
        if let Some(end) = end {
            query.push(" AND date(o.created_at) <= ").push_bind(end);
        }
        query.push(" GROUP BY date(o.created_at) ORDER BY date DESC");

        let rows = query.build_query_as::<SalesReportRow>().fetch_all(executor).await?;
        Ok(rows)
    }
}

