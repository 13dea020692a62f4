// src/services/import_service.rs

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    common::{error::AppError, money::Money},
    db::{catalog_repo::ProductFields, CatalogRepository, CustomerRepository, StockRepository},
    models::{
        catalog::CategoryPayload,
        customer::CustomerPayload,
        import::{ImportReport, RowError},
        stock::{MovementType, NewMovement, ReferenceType},
    },
};

// =============================================================================
// CSV parsing
// =============================================================================

/// Rows that passed validation, keyed by their 1-based row number, plus the
/// ones that did not.
#[derive(Debug)]
pub struct ParsedRows<T> {
    pub rows: Vec<(usize, T)>,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Deserialize)]
struct CustomerRecord {
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProductRecord {
    name: Option<String>,
    category: Option<String>,
    price: Option<String>,
    cost_price: Option<String>,
    stock: Option<String>,
    warranty_months: Option<String>,
    low_stock_threshold: Option<String>,
    brand: Option<String>,
    model: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub name: String,
    pub category: String,
    pub price: Money,
    pub cost_price: Option<Money>,
    pub stock: i64,
    pub warranty_months: i64,
    pub low_stock_threshold: i64,
    pub brand: Option<String>,
    pub model: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn required(value: Option<String>, column: &str) -> Result<String, String> {
    present(value).ok_or_else(|| format!("Missing required field '{column}'"))
}

fn parse_money(value: &str, column: &str) -> Result<Money, String> {
    let money = Decimal::from_str(value)
        .ok()
        .and_then(Money::from_decimal)
        .ok_or_else(|| format!("Invalid amount '{value}' in '{column}'"))?;
    if money.is_negative() {
        return Err(format!("'{column}' cannot be negative"));
    }
    Ok(money)
}

fn parse_count(value: Option<String>, column: &str, default: i64) -> Result<i64, String> {
    match present(value) {
        None => Ok(default),
        Some(raw) => match raw.parse::<i64>() {
            Ok(n) if n >= 0 => Ok(n),
            Ok(_) => Err(format!("'{column}' cannot be negative")),
            Err(_) => Err(format!("Invalid number '{raw}' in '{column}'")),
        },
    }
}

fn parse_rows<R, T, F>(data: &[u8], mut convert: F) -> Result<ParsedRows<T>, AppError>
where
    R: for<'de> Deserialize<'de>,
    F: FnMut(R) -> Result<T, String>,
{
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);
    reader
        .headers()
        .map_err(|e| AppError::BadRequest(format!("Unreadable CSV file: {e}")))?;

    let mut parsed = ParsedRows { rows: Vec::new(), errors: Vec::new() };
    for (index, record) in reader.deserialize::<R>().enumerate() {
        let row = index + 1;
        let outcome = record
            .map_err(|e| format!("Malformed row: {e}"))
            .and_then(&mut convert);
        match outcome {
            Ok(value) => parsed.rows.push((row, value)),
            Err(message) => parsed.errors.push(RowError { row, message }),
        }
    }
    Ok(parsed)
}

pub fn parse_customer_csv(data: &[u8]) -> Result<ParsedRows<CustomerPayload>, AppError> {
    parse_rows(data, |record: CustomerRecord| {
        let payload = CustomerPayload {
            name: required(record.name, "name")?,
            email: present(record.email),
            phone: required(record.phone, "phone")?,
            address: present(record.address),
            city: present(record.city),
            state: present(record.state),
            zip_code: present(record.zip_code),
            birthday: None,
        };
        payload.validate().map_err(|e| e.to_string())?;
        Ok(payload)
    })
}

pub fn parse_product_csv(data: &[u8]) -> Result<ParsedRows<ProductRow>, AppError> {
    parse_rows(data, |record: ProductRecord| {
        let name = required(record.name, "name")?;
        let category = required(record.category, "category")?;
        let price = parse_money(&required(record.price, "price")?, "price")?;
        let cost_price = present(record.cost_price)
            .map(|raw| parse_money(&raw, "cost_price"))
            .transpose()?;

        Ok(ProductRow {
            name,
            category,
            price,
            cost_price,
            stock: parse_count(record.stock, "stock", 0)?,
            warranty_months: parse_count(record.warranty_months, "warranty_months", 0)?,
            low_stock_threshold: parse_count(record.low_stock_threshold, "low_stock_threshold", 10)?,
            brand: present(record.brand),
            model: present(record.model),
        })
    })
}

// =============================================================================
// Service
// =============================================================================

#[derive(Clone)]
pub struct ImportService {
    pool: SqlitePool,
    customer_repo: CustomerRepository,
    catalog_repo: CatalogRepository,
    stock_repo: StockRepository,
}

impl ImportService {
    pub fn new(
        pool: SqlitePool,
        customer_repo: CustomerRepository,
        catalog_repo: CatalogRepository,
        stock_repo: StockRepository,
    ) -> Self {
        Self { pool, customer_repo, catalog_repo, stock_repo }
    }

    pub async fn import_customers(&self, data: &[u8]) -> Result<ImportReport, AppError> {
        let parsed = parse_customer_csv(data)?;
        if parsed.rows.is_empty() {
            return Err(AppError::BadRequest(no_rows_message("customers", &parsed.errors)));
        }

        let mut report = ImportReport { imported: 0, errors: parsed.errors };
        for (row, payload) in parsed.rows {
            match self.customer_repo.create(&self.pool, &payload).await {
                Ok(_) => report.imported += 1,
                Err(e) => report.errors.push(row_failure(row, e)?),
            }
        }

        report.errors.sort_by_key(|e| e.row);
        tracing::info!(imported = report.imported, failed = report.errors.len(), "customer import finished");
        Ok(report)
    }

    pub async fn import_products(&self, data: &[u8], user_id: i64) -> Result<ImportReport, AppError> {
        let parsed = parse_product_csv(data)?;
        if parsed.rows.is_empty() {
            return Err(AppError::BadRequest(no_rows_message("products", &parsed.errors)));
        }

        let mut report = ImportReport { imported: 0, errors: parsed.errors };
        for (row, product) in parsed.rows {
            match self.import_product(&product, user_id).await {
                Ok(()) => report.imported += 1,
                Err(e) => report.errors.push(row_failure(row, e)?),
            }
        }

        report.errors.sort_by_key(|e| e.row);
        tracing::info!(imported = report.imported, failed = report.errors.len(), "product import finished");
        Ok(report)
    }

    /// One row, one transaction: category lookup or creation, the product,
    /// and its opening stock.
    async fn import_product(&self, product: &ProductRow, user_id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let category_id = match self.catalog_repo.find_category_by_name(&mut *tx, &product.category).await? {
            Some(category) if category.active => category.id,
            Some(_) => {
                return Err(AppError::BadRequest(format!(
                    "Category '{}' is inactive",
                    product.category
                )));
            }
            None => {
                let payload = CategoryPayload {
                    name: product.category.clone(),
                    description: Some(format!("Auto-created category for {}", product.category)),
                    icon: None,
                };
                let category = self.catalog_repo.create_category(&mut *tx, &payload).await?;
                tracing::debug!(category_id = category.id, name = %category.name, "category created by import");
                category.id
            }
        };

        let fields = ProductFields {
            name: &product.name,
            category_id,
            price: product.price,
            cost_price: product.cost_price,
            low_stock_threshold: product.low_stock_threshold,
            warranty_months: product.warranty_months,
            description: None,
            brand: product.brand.as_deref(),
            model: product.model.as_deref(),
            image_url: None,
        };
        let product_id = self.catalog_repo.insert_product(&mut *tx, &fields).await?;

        if product.stock > 0 {
            let movement = NewMovement {
                product_id,
                movement_type: MovementType::In,
                quantity: product.stock,
                reference_type: ReferenceType::Initial,
                reference_id: Some(product_id),
                notes: Some("Initial stock from import".to_string()),
                created_by: user_id,
            };
            self.stock_repo.record_movement(&mut tx, &movement, false).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

fn no_rows_message(entity: &str, errors: &[RowError]) -> String {
    match errors.first() {
        Some(first) => format!("No valid {entity} found in file (row {}: {})", first.row, first.message),
        None => format!("No valid {entity} found in file"),
    }
}

/// Client-side failures become row errors; store failures abort the import.
fn row_failure(row: usize, error: AppError) -> Result<RowError, AppError> {
    match error {
        AppError::BadRequest(message) | AppError::Conflict(message) => Ok(RowError { row, message }),
        AppError::NotFound(entity) => Ok(RowError { row, message: format!("{entity} not found") }),
        AppError::ValidationError(e) => Ok(RowError { row, message: e.to_string() }),
        other => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{catalog::ProductFilter, customer::CustomerFilter},
        test_support::{count_rows, test_state, ADMIN_ID},
    };

    #[test]
    fn customer_rows_need_name_and_phone() {
        let csv = "name,email,phone,city\nAna,ana@example.com,555-1,Lisbon\n,x@example.com,555-2,\nBea,,,\n";
        let parsed = parse_customer_csv(csv.as_bytes()).unwrap();

        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].1.city.as_deref(), Some("Lisbon"));
        let failed: Vec<usize> = parsed.errors.iter().map(|e| e.row).collect();
        assert_eq!(failed, vec![2, 3]);
        assert_eq!(parsed.errors[0].message, "Missing required field 'name'");
    }

    #[test]
    fn invalid_email_is_a_row_error() {
        let parsed = parse_customer_csv(b"name,email,phone\nAna,not-an-email,555\n").unwrap();
        assert!(parsed.rows.is_empty());
        assert_eq!(parsed.errors.len(), 1);
    }

    #[test]
    fn product_rows_apply_defaults_and_check_numbers() {
        let csv = "name,category,price,stock,brand\n\
                   Phone X,Smartphones,499.99,3,Acme\n\
                   Cable,Accessories,abc,1,\n\
                   Case,Accessories,9.50,-2,\n";
        let parsed = parse_product_csv(csv.as_bytes()).unwrap();

        assert_eq!(parsed.rows.len(), 1);
        let (row, product) = &parsed.rows[0];
        assert_eq!(*row, 1);
        assert_eq!(product.price, Money::from_cents(49_999));
        assert_eq!(product.stock, 3);
        assert_eq!(product.low_stock_threshold, 10);
        assert_eq!(product.warranty_months, 0);
        assert_eq!(product.brand.as_deref(), Some("Acme"));

        assert_eq!(parsed.errors[0].row, 2);
        assert_eq!(parsed.errors[0].message, "Invalid amount 'abc' in 'price'");
        assert_eq!(parsed.errors[1].message, "'stock' cannot be negative");
    }

    #[tokio::test]
    async fn customer_import_reports_partial_success() {
        let state = test_state().await;
        let csv = "name,email,phone\nAna,ana@example.com,1\nBen,ana@example.com,2\nCid,,\n";

        let report = state.import_service.import_customers(csv.as_bytes()).await.unwrap();
        assert_eq!(report.imported, 1);
        let failed: Vec<usize> = report.errors.iter().map(|e| e.row).collect();
        assert_eq!(failed, vec![2, 3]);

        let customers = state.customer_service.list(&CustomerFilter::default()).await.unwrap();
        assert_eq!(customers.len(), 1);
    }

    #[tokio::test]
    async fn product_import_creates_categories_and_opening_stock() {
        let state = test_state().await;
        let csv = "name,category,price,stock\nDrone,Gadgets,120.00,4\nBattery,Gadgets,15,0\n";

        let report = state.import_service.import_products(csv.as_bytes(), ADMIN_ID).await.unwrap();
        assert_eq!(report.imported, 2);
        assert!(report.errors.is_empty());

        let gadgets = state
            .catalog_service
            .list_products(&ProductFilter { category: Some("Gadgets".into()), low_stock: None })
            .await
            .unwrap();
        assert_eq!(gadgets.len(), 2);
        let drone = gadgets.iter().find(|p| p.name == "Drone").unwrap();
        assert_eq!(drone.stock, 4);
        assert_eq!(count_rows(&state.db_pool, "stock_movements").await, 1);

        let ledger = state.catalog_service.movements(drone.id).await.unwrap();
        assert_eq!(ledger.ledger_stock, 4);
    }

    #[tokio::test]
    async fn nothing_importable_is_a_bad_request() {
        let state = test_state().await;
        let result = state.import_service.import_products(b"name,category,price\n,,\n", ADMIN_ID).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let result = state.import_service.import_customers(b"").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
