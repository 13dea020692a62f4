// src/services/reminder_service.rs

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::{
    common::error::AppError,
    db::{ReminderRepository, SettingsRepository},
    models::{
        reminder::{GenerationReport, NewReminder, Priority, Reminder, ReminderFilter, ReminderStatus, ReminderType},
        settings::StoreSettings,
    },
    services::scheduler::PeriodicTask,
};

#[derive(Clone)]
pub struct ReminderService {
    pool: SqlitePool,
    reminder_repo: ReminderRepository,
    settings_repo: SettingsRepository,
}

impl ReminderService {
    pub fn new(pool: SqlitePool, reminder_repo: ReminderRepository, settings_repo: SettingsRepository) -> Self {
        Self { pool, reminder_repo, settings_repo }
    }

    pub async fn list(&self, filter: &ReminderFilter) -> Result<Vec<Reminder>, AppError> {
        self.reminder_repo.list(&self.pool, filter).await
    }

    pub async fn update_status(&self, id: i64, status: ReminderStatus) -> Result<Reminder, AppError> {
        self.reminder_repo
            .update_status(&self.pool, id, status)
            .await?
            .ok_or(AppError::NotFound("Reminder"))
    }

    /// One scan over products, open balances and birthdays. Inserts are
    /// idempotent while a matching reminder is still active.
    pub async fn generate(&self) -> Result<GenerationReport, AppError> {
        let settings = StoreSettings::from(&self.settings_repo.get_all(&self.pool).await?);
        let mut report = GenerationReport::default();

        if settings.low_stock_alert {
            for product in self.reminder_repo.low_stock_candidates(&self.pool).await? {
                let reminder = NewReminder {
                    reminder_type: ReminderType::LowStock,
                    title: "Low Stock Alert".to_string(),
                    message: format!(
                        "{} is running low on stock ({} remaining)",
                        product.name, product.stock
                    ),
                    reference_id: product.id,
                    reference_type: "product",
                    priority: Priority::High,
                };
                if self.reminder_repo.insert_if_absent(&self.pool, &reminder).await? {
                    report.low_stock += 1;
                }
            }
        }

        if settings.payment_reminder {
            for order in self.reminder_repo.payment_due_candidates(&self.pool).await? {
                let customer = order
                    .customer_name
                    .as_deref()
                    .map(|name| format!(" ({name})"))
                    .unwrap_or_default();
                let reminder = NewReminder {
                    reminder_type: ReminderType::PaymentDue,
                    title: "Payment Due".to_string(),
                    message: format!(
                        "Payment of {}{} is due for order {}{}",
                        settings.currency_symbol, order.due_amount, order.order_number, customer
                    ),
                    reference_id: order.id,
                    reference_type: "order",
                    priority: Priority::Medium,
                };
                if self.reminder_repo.insert_if_absent(&self.pool, &reminder).await? {
                    report.payment_due += 1;
                }
            }
        }

        let today = Utc::now().format("%m-%d").to_string();
        for customer in self.reminder_repo.birthday_candidates(&self.pool, &today).await? {
            let reminder = NewReminder {
                reminder_type: ReminderType::Birthday,
                title: "Customer Birthday".to_string(),
                message: format!("Today is {}'s birthday", customer.name),
                reference_id: customer.id,
                reference_type: "customer",
                priority: Priority::Low,
            };
            if self.reminder_repo.insert_if_absent(&self.pool, &reminder).await? {
                report.birthday += 1;
            }
        }

        tracing::info!(
            low_stock = report.low_stock,
            payment_due = report.payment_due,
            birthday = report.birthday,
            "reminder scan finished"
        );
        Ok(report)
    }

    pub fn scan_task(&self) -> Arc<dyn PeriodicTask> {
        Arc::new(ReminderScan { service: self.clone() })
    }
}

/// Daily reminder scan.
struct ReminderScan {
    service: ReminderService,
}

#[async_trait]
impl PeriodicTask for ReminderScan {
    fn name(&self) -> &'static str {
        "reminder-scan"
    }

    async fn run(&self) -> anyhow::Result<()> {
        self.service
            .generate()
            .await
            .map_err(|e| anyhow::anyhow!("reminder scan failed: {e}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use crate::{
        models::customer::CustomerPayload,
        test_support::{seed_product, test_state},
    };

    fn of_type(reminder_type: ReminderType) -> ReminderFilter {
        ReminderFilter { reminder_type: Some(reminder_type), status: None }
    }

    #[tokio::test]
    async fn low_stock_is_reported_once() {
        let state = test_state().await;
        let product = seed_product(&state, "Soundbar", 15_000, 5).await;

        let first = state.reminder_service.generate().await.unwrap();
        assert_eq!(first.low_stock, 1);
        let second = state.reminder_service.generate().await.unwrap();
        assert_eq!(second.total(), 0);

        let reminders = state.reminder_service.list(&of_type(ReminderType::LowStock)).await.unwrap();
        assert_eq!(reminders.len(), 1);
        assert_eq!(reminders[0].reference_id, Some(product.id));
        assert_eq!(reminders[0].priority, Priority::High);
        assert_eq!(reminders[0].message, "Soundbar is running low on stock (5 remaining)");
    }

    #[tokio::test]
    async fn dismissed_reminders_can_be_raised_again() {
        let state = test_state().await;
        seed_product(&state, "Projector", 40_000, 2).await;
        state.reminder_service.generate().await.unwrap();

        let reminder = &state.reminder_service.list(&of_type(ReminderType::LowStock)).await.unwrap()[0];
        let dismissed = state
            .reminder_service
            .update_status(reminder.id, ReminderStatus::Dismissed)
            .await
            .unwrap();
        assert_eq!(dismissed.status, ReminderStatus::Dismissed);

        let report = state.reminder_service.generate().await.unwrap();
        assert_eq!(report.low_stock, 1);
    }

    #[tokio::test]
    async fn toggles_switch_scans_off() {
        let state = test_state().await;
        seed_product(&state, "Fan", 3_000, 1).await;

        let mut changes = std::collections::BTreeMap::new();
        changes.insert("low_stock_alert".to_string(), serde_json::json!("0"));
        state.settings_service.update(changes).await.unwrap();

        let report = state.reminder_service.generate().await.unwrap();
        assert_eq!(report.low_stock, 0);
    }

    #[tokio::test]
    async fn birthdays_get_a_low_priority_reminder() {
        let state = test_state().await;
        let today = Utc::now().date_naive();
        let birthday = today.with_year(1990).unwrap_or(today);
        state
            .customer_service
            .create(&CustomerPayload {
                name: "Lena".into(),
                phone: "1".into(),
                birthday: Some(birthday),
                ..Default::default()
            })
            .await
            .unwrap();

        let report = state.reminder_service.generate().await.unwrap();
        assert_eq!(report.birthday, 1);
        let reminders = state.reminder_service.list(&of_type(ReminderType::Birthday)).await.unwrap();
        assert_eq!(reminders[0].priority, Priority::Low);
    }

    #[tokio::test]
    async fn unknown_reminder_is_not_found() {
        let state = test_state().await;
        assert!(matches!(
            state.reminder_service.update_status(42, ReminderStatus::Dismissed).await,
            Err(AppError::NotFound("Reminder"))
        ));
    }

    #[tokio::test]
    async fn scan_task_runs_the_generator() {
        let state = test_state().await;
        seed_product(&state, "Lamp", 2_000, 0).await;

        let task = state.reminder_service.scan_task();
        assert_eq!(task.name(), "reminder-scan");
        task.run().await.unwrap();

        let reminders = state.reminder_service.list(&ReminderFilter::default()).await.unwrap();
        assert_eq!(reminders.len(), 1);
    }
}
