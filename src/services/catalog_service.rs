// src/services/catalog_service.rs

use sqlx::{SqliteConnection, SqlitePool};

use crate::{
    common::error::AppError,
    config::OversellPolicy,
    db::{catalog_repo::ProductFields, CatalogRepository, StockRepository},
    models::{
        catalog::{Category, CategoryPayload, CreateProductPayload, Product, ProductFilter, UpdateProductPayload},
        stock::{AdjustStockPayload, MovementType, NewMovement, ProductMovements, ReferenceType},
    },
};

#[derive(Clone)]
pub struct CatalogService {
    pool: SqlitePool,
    catalog_repo: CatalogRepository,
    stock_repo: StockRepository,
    oversell_policy: OversellPolicy,
}

impl CatalogService {
    pub fn new(
        pool: SqlitePool,
        catalog_repo: CatalogRepository,
        stock_repo: StockRepository,
        oversell_policy: OversellPolicy,
    ) -> Self {
        Self { pool, catalog_repo, stock_repo, oversell_policy }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        self.catalog_repo.list_categories(&self.pool).await
    }

    pub async fn create_category(&self, payload: &CategoryPayload) -> Result<Category, AppError> {
        let category = self.catalog_repo.create_category(&self.pool, payload).await?;
        tracing::info!(category_id = category.id, name = %category.name, "category created");
        Ok(category)
    }

    pub async fn update_category(&self, id: i64, payload: &CategoryPayload) -> Result<Category, AppError> {
        self.catalog_repo
            .update_category(&self.pool, id, payload)
            .await?
            .ok_or(AppError::NotFound("Category"))
    }

    pub async fn deactivate_category(&self, id: i64) -> Result<(), AppError> {
        if !self.catalog_repo.deactivate_category(&self.pool, id).await? {
            return Err(AppError::NotFound("Category"));
        }
        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        self.catalog_repo.list_products(&self.pool, filter).await
    }

    pub async fn get_product(&self, id: i64) -> Result<Product, AppError> {
        self.catalog_repo
            .find_product(&self.pool, id)
            .await?
            .ok_or(AppError::NotFound("Product"))
    }

    pub async fn create_product(&self, payload: &CreateProductPayload, user_id: i64) -> Result<Product, AppError> {
        let mut tx = self.pool.begin().await?;

        self.ensure_active_category(&mut tx, payload.category_id).await?;

        let fields = ProductFields {
            name: payload.name.trim(),
            category_id: payload.category_id,
            price: payload.price,
            cost_price: payload.cost_price,
            low_stock_threshold: payload.low_stock_threshold,
            warranty_months: payload.warranty_months,
            description: payload.description.as_deref(),
            brand: payload.brand.as_deref(),
            model: payload.model.as_deref(),
            image_url: payload.image_url.as_deref(),
        };
        let product_id = self.catalog_repo.insert_product(&mut *tx, &fields).await?;

        // Opening stock goes through the ledger like any other movement
        if payload.stock > 0 {
            let movement = NewMovement {
                product_id,
                movement_type: MovementType::In,
                quantity: payload.stock,
                reference_type: ReferenceType::Initial,
                reference_id: Some(product_id),
                notes: Some("Initial stock".to_string()),
                created_by: user_id,
            };
            self.stock_repo.record_movement(&mut tx, &movement, false).await?;
        }

        tx.commit().await?;
        tracing::info!(product_id, stock = payload.stock, "product created");

        self.get_product(product_id).await
    }

    pub async fn update_product(
        &self,
        id: i64,
        payload: &UpdateProductPayload,
        user_id: i64,
    ) -> Result<Product, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self
            .catalog_repo
            .find_product(&mut *tx, id)
            .await?
            .ok_or(AppError::NotFound("Product"))?;
        self.ensure_active_category(&mut tx, payload.category_id).await?;

        let fields = ProductFields {
            name: payload.name.trim(),
            category_id: payload.category_id,
            price: payload.price,
            cost_price: payload.cost_price,
            low_stock_threshold: payload.low_stock_threshold,
            warranty_months: payload.warranty_months,
            description: payload.description.as_deref(),
            brand: payload.brand.as_deref(),
            model: payload.model.as_deref(),
            image_url: payload.image_url.as_deref(),
        };
        self.catalog_repo.update_product_fields(&mut *tx, id, &fields).await?;

        // A target stock becomes an adjustment for the difference
        if let Some(target) = payload.stock {
            let delta = target - current.stock;
            if delta != 0 {
                let movement = NewMovement {
                    product_id: id,
                    movement_type: MovementType::Adjustment,
                    quantity: delta,
                    reference_type: ReferenceType::Adjustment,
                    reference_id: None,
                    notes: Some("Stock corrected on product update".to_string()),
                    created_by: user_id,
                };
                self.stock_repo.record_movement(&mut tx, &movement, true).await?;
            }
        }

        tx.commit().await?;
        self.get_product(id).await
    }

    pub async fn adjust_stock(&self, id: i64, payload: &AdjustStockPayload, user_id: i64) -> Result<Product, AppError> {
        let mut tx = self.pool.begin().await?;

        let movement = NewMovement {
            product_id: id,
            movement_type: MovementType::Adjustment,
            quantity: payload.quantity,
            reference_type: ReferenceType::Adjustment,
            reference_id: None,
            notes: payload.notes.clone(),
            created_by: user_id,
        };
        self.stock_repo
            .record_movement(&mut tx, &movement, self.oversell_policy.allows_negative_stock())
            .await?;

        tx.commit().await?;
        tracing::info!(product_id = id, delta = payload.quantity, user_id, "stock adjusted");

        self.get_product(id).await
    }

    pub async fn movements(&self, id: i64) -> Result<ProductMovements, AppError> {
        let product = self.get_product(id).await?;
        let movements = self.stock_repo.list_for_product(&self.pool, id).await?;
        let ledger_stock = self.stock_repo.ledger_stock(&self.pool, id).await?;

        if ledger_stock != product.stock {
            tracing::warn!(product_id = id, cached = product.stock, ledger_stock, "stock cache diverges from ledger");
        }

        Ok(ProductMovements {
            product_id: id,
            cached_stock: product.stock,
            ledger_stock,
            movements,
        })
    }

    pub async fn deactivate_product(&self, id: i64) -> Result<(), AppError> {
        if !self.catalog_repo.deactivate_product(&self.pool, id).await? {
            return Err(AppError::NotFound("Product"));
        }
        tracing::info!(product_id = id, "product deactivated");
        Ok(())
    }

    async fn ensure_active_category(&self, conn: &mut SqliteConnection, category_id: i64) -> Result<(), AppError> {
        match self.catalog_repo.find_category(&mut *conn, category_id).await? {
            Some(category) if category.active => Ok(()),
            _ => Err(AppError::NotFound("Category")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_product, test_state, ADMIN_ID};

    #[tokio::test]
    async fn opening_stock_is_recorded_in_the_ledger() {
        let state = test_state().await;
        let product = seed_product(&state, "Phone", 10_000, 12).await;
        assert_eq!(product.stock, 12);

        let ledger = state.catalog_service.movements(product.id).await.unwrap();
        assert_eq!(ledger.ledger_stock, 12);
        assert_eq!(ledger.movements.len(), 1);
        assert_eq!(ledger.movements[0].reference_type, ReferenceType::Initial);
    }

    #[tokio::test]
    async fn update_with_target_stock_books_an_adjustment() {
        let state = test_state().await;
        let product = seed_product(&state, "Tablet", 20_000, 5).await;

        let payload = UpdateProductPayload {
            name: "Tablet Pro".into(),
            category_id: product.category_id,
            price: product.price,
            cost_price: None,
            stock: Some(2),
            low_stock_threshold: 10,
            warranty_months: 12,
            description: None,
            brand: None,
            model: None,
            image_url: None,
        };
        let updated = state
            .catalog_service
            .update_product(product.id, &payload, ADMIN_ID)
            .await
            .unwrap();
        assert_eq!(updated.name, "Tablet Pro");
        assert_eq!(updated.stock, 2);

        let ledger = state.catalog_service.movements(product.id).await.unwrap();
        assert_eq!(ledger.ledger_stock, 2);
        assert_eq!(ledger.movements[0].movement_type, MovementType::Adjustment);
        assert_eq!(ledger.movements[0].quantity, -3);
    }

    #[tokio::test]
    async fn adjustment_below_zero_is_refused_under_reject_policy() {
        let state = test_state().await;
        let product = seed_product(&state, "Cable", 500, 1).await;

        let result = state
            .catalog_service
            .adjust_stock(product.id, &AdjustStockPayload { quantity: -2, notes: None }, ADMIN_ID)
            .await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(state.catalog_service.get_product(product.id).await.unwrap().stock, 1);
    }

    #[tokio::test]
    async fn duplicate_category_and_unknown_category() {
        let state = test_state().await;
        let payload = CategoryPayload { name: "laptops".into(), description: None, icon: None };
        assert!(matches!(
            state.catalog_service.create_category(&payload).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            state.catalog_service.update_category(999, &payload).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn low_stock_filter() {
        let state = test_state().await;
        seed_product(&state, "Low", 100, 3).await;
        seed_product(&state, "Plenty", 100, 50).await;

        let low = state
            .catalog_service
            .list_products(&ProductFilter { category: None, low_stock: Some(true) })
            .await
            .unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].name, "Low");
        assert_eq!(low[0].category_name.as_deref(), Some("smartphones"));
    }
}
