// src/models/settings.rs

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

pub type SettingsMap = BTreeMap<String, String>;

// Keys read by the workflows
pub const TAX_RATE: &str = "tax_rate";
pub const RETURN_DAYS: &str = "return_days";
pub const LOW_STOCK_ALERT: &str = "low_stock_alert";
pub const PAYMENT_REMINDER: &str = "payment_reminder";
pub const CURRENCY_SYMBOL: &str = "currency_symbol";

/// Typed view over the key/value settings, falling back to defaults for
/// missing or unparsable values.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StoreSettings {
    #[schema(value_type = f64)]
    pub tax_rate: Decimal,
    pub return_days: i64,
    pub low_stock_alert: bool,
    pub payment_reminder: bool,
    pub currency_symbol: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(180, 1),
            return_days: 7,
            low_stock_alert: true,
            payment_reminder: true,
            currency_symbol: "$".to_string(),
        }
    }
}

fn flag(value: &str) -> bool {
    matches!(value.trim(), "1" | "true" | "yes" | "on")
}

impl From<&SettingsMap> for StoreSettings {
    fn from(map: &SettingsMap) -> Self {
        let defaults = StoreSettings::default();
        Self {
            tax_rate: map
                .get(TAX_RATE)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.tax_rate),
            return_days: map
                .get(RETURN_DAYS)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.return_days),
            low_stock_alert: map.get(LOW_STOCK_ALERT).map(|v| flag(v)).unwrap_or(true),
            payment_reminder: map.get(PAYMENT_REMINDER).map(|v| flag(v)).unwrap_or(true),
            currency_symbol: map
                .get(CURRENCY_SYMBOL)
                .cloned()
                .unwrap_or(defaults.currency_symbol),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_view_parses_and_falls_back() {
        let mut map = SettingsMap::new();
        map.insert(RETURN_DAYS.into(), "14".into());
        map.insert(LOW_STOCK_ALERT.into(), "0".into());
        map.insert(TAX_RATE.into(), "not-a-number".into());

        let settings = StoreSettings::from(&map);
        assert_eq!(settings.return_days, 14);
        assert!(!settings.low_stock_alert);
        assert!(settings.payment_reminder);
        assert_eq!(settings.tax_rate, Decimal::new(180, 1));
        assert_eq!(settings.currency_symbol, "$");
    }
}
