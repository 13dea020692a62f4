// src/models/reminder.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReminderType {
    PaymentDue,
    LowStock,
    ReturnExpiry,
    Birthday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Active,
    Dismissed,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Reminder {
    pub id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub reminder_type: ReminderType,
    pub title: String,
    pub message: String,
    pub reference_id: Option<i64>,
    pub reference_type: Option<String>,
    pub status: ReminderStatus,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReminder {
    pub reminder_type: ReminderType,
    pub title: String,
    pub message: String,
    pub reference_id: i64,
    pub reference_type: &'static str,
    pub priority: Priority,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReminderPayload {
    pub status: ReminderStatus,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReminderFilter {
    #[serde(rename = "type")]
    pub reminder_type: Option<ReminderType>,
    pub status: Option<ReminderStatus>,
}

/// Reminders created by one scan, per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct GenerationReport {
    pub low_stock: u64,
    pub payment_due: u64,
    pub birthday: u64,
}

impl GenerationReport {
    pub fn total(&self) -> u64 {
        self.low_stock + self.payment_due + self.birthday
    }
}
