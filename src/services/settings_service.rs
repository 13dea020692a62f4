// src/services/settings_service.rs

use std::collections::BTreeMap;

use serde_json::Value;
use sqlx::SqlitePool;

use crate::{
    common::error::AppError,
    db::SettingsRepository,
    models::settings::{SettingsMap, StoreSettings},
};

#[derive(Clone)]
pub struct SettingsService {
    pool: SqlitePool,
    settings_repo: SettingsRepository,
}

impl SettingsService {
    pub fn new(pool: SqlitePool, settings_repo: SettingsRepository) -> Self {
        Self { pool, settings_repo }
    }

    pub async fn get_all(&self) -> Result<SettingsMap, AppError> {
        self.settings_repo.get_all(&self.pool).await
    }

    pub async fn typed(&self) -> Result<StoreSettings, AppError> {
        Ok(StoreSettings::from(&self.get_all().await?))
    }

    /// Upserts every pair or none. Values are stored as text: strings
    /// verbatim, anything else in its JSON form (`18`, `true`).
    pub async fn update(&self, changes: BTreeMap<String, Value>) -> Result<SettingsMap, AppError> {
        if changes.is_empty() {
            return Err(AppError::BadRequest("No settings provided".to_string()));
        }
        if let Some((key, _)) = changes.iter().find(|(key, _)| key.trim().is_empty()) {
            return Err(AppError::BadRequest(format!("Invalid setting key '{key}'")));
        }

        let mut tx = self.pool.begin().await?;
        for (key, value) in &changes {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            self.settings_repo.upsert(&mut *tx, key, &text).await?;
        }
        tx.commit().await?;

        tracing::info!(keys = ?changes.keys().collect::<Vec<_>>(), "settings updated");
        self.get_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::settings::RETURN_DAYS, test_support::test_state};
    use serde_json::json;

    #[tokio::test]
    async fn defaults_are_seeded() {
        let state = test_state().await;
        let settings = state.settings_service.typed().await.unwrap();
        assert_eq!(settings.return_days, 7);
        assert!(settings.low_stock_alert);
        assert!(settings.payment_reminder);
    }

    #[tokio::test]
    async fn update_stores_values_as_text() {
        let state = test_state().await;
        let mut changes = BTreeMap::new();
        changes.insert(RETURN_DAYS.to_string(), json!(14));
        changes.insert("store_name".to_string(), json!("Volt & Co"));

        let all = state.settings_service.update(changes).await.unwrap();
        assert_eq!(all.get(RETURN_DAYS).map(String::as_str), Some("14"));
        assert_eq!(all.get("store_name").map(String::as_str), Some("Volt & Co"));
        assert_eq!(state.settings_service.typed().await.unwrap().return_days, 14);
    }

    #[tokio::test]
    async fn empty_update_is_rejected() {
        let state = test_state().await;
        let result = state.settings_service.update(BTreeMap::new()).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
