// src/db/catalog_repo.rs

use chrono::Utc;
use sqlx::{Executor, QueryBuilder, Sqlite};

use crate::{
    common::{
        error::{conflict_on_unique, AppError},
        money::Money,
    },
    models::catalog::{Category, CategoryPayload, Product, ProductFilter},
};

const PRODUCT_SELECT: &str = r#"
    SELECT p.*, c.name AS category_name, c.icon AS category_icon
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

/// Catalog fields of a product. Stock is never written here, only through
/// the stock ledger.
pub struct ProductFields<'a> {
    pub name: &'a str,
    pub category_id: i64,
    pub price: Money,
    pub cost_price: Option<Money>,
    pub low_stock_threshold: i64,
    pub warranty_months: i64,
    pub description: Option<&'a str>,
    pub brand: Option<&'a str>,
    pub model: Option<&'a str>,
    pub image_url: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogRepository;

impl CatalogRepository {
    // =========================================================================
    // Categories
    // =========================================================================

    pub async fn list_categories<'e, E>(&self, executor: E) -> Result<Vec<Category>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE active = 1 ORDER BY name ASC")
                .fetch_all(executor)
                .await?;
        Ok(categories)
    }

    pub async fn find_category<'e, E>(&self, executor: E, id: i64) -> Result<Option<Category>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(category)
    }

    pub async fn find_category_by_name<'e, E>(&self, executor: E, name: &str) -> Result<Option<Category>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let category = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE name = ?1")
            .bind(name)
            .fetch_optional(executor)
            .await?;
        Ok(category)
    }

    pub async fn create_category<'e, E>(&self, executor: E, payload: &CategoryPayload) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, description, icon, active, created_at)
            VALUES (?1, ?2, ?3, 1, ?4)
            RETURNING *
            "#,
        )
        .bind(payload.name.trim())
        .bind(&payload.description)
        .bind(&payload.icon)
        .bind(Utc::now())
        .fetch_one(executor)
        .await
        .map_err(|e| conflict_on_unique(e, "Category name already exists"))
    }

    pub async fn update_category<'e, E>(
        &self,
        executor: E,
        id: i64,
        payload: &CategoryPayload,
    ) -> Result<Option<Category>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = ?1, description = ?2, icon = ?3 WHERE id = ?4 RETURNING *",
        )
        .bind(payload.name.trim())
        .bind(&payload.description)
        .bind(&payload.icon)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(|e| conflict_on_unique(e, "Category name already exists"))
    }

    pub async fn deactivate_category<'e, E>(&self, executor: E, id: i64) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE categories SET active = 0 WHERE id = ?1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Products
    // =========================================================================

    pub async fn list_products<'e, E>(&self, executor: E, filter: &ProductFilter) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let mut query = QueryBuilder::<Sqlite>::new(PRODUCT_SELECT);
        query.push(" WHERE p.active = 1");

        if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
            query.push(" AND c.name = ").push_bind(category.to_string());
        }
        if filter.low_stock == Some(true) {
            query.push(" AND p.stock <= p.low_stock_threshold");
        }
        query.push(" ORDER BY p.name ASC");

        let products = query.build_query_as::<Product>().fetch_all(executor).await?;
        Ok(products)
    }

    pub async fn find_product<'e, E>(&self, executor: E, id: i64) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let sql = format!("{PRODUCT_SELECT} WHERE p.id = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    /// Inserts a product with zero stock and returns its id.
    pub async fn insert_product<'e, E>(&self, executor: E, fields: &ProductFields<'_>) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let now = Utc::now();
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO products (
                name, category_id, price, cost_price, stock, low_stock_threshold, warranty_months,
                description, brand, model, image_url, active, created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7, ?8, ?9, ?10, 1, ?11, ?11)
            RETURNING id
            "#,
        )
        .bind(fields.name)
        .bind(fields.category_id)
        .bind(fields.price)
        .bind(fields.cost_price)
        .bind(fields.low_stock_threshold)
        .bind(fields.warranty_months)
        .bind(fields.description)
        .bind(fields.brand)
        .bind(fields.model)
        .bind(fields.image_url)
        .bind(now)
        .fetch_one(executor)
        .await?;
        Ok(id)
    }

    pub async fn update_product_fields<'e, E>(
        &self,
        executor: E,
        id: i64,
        fields: &ProductFields<'_>,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = ?1, category_id = ?2, price = ?3, cost_price = ?4, low_stock_threshold = ?5,
                warranty_months = ?6, description = ?7, brand = ?8, model = ?9, image_url = ?10,
                updated_at = ?11
            WHERE id = ?12
            "#,
        )
        .bind(fields.name)
        .bind(fields.category_id)
        .bind(fields.price)
        .bind(fields.cost_price)
        .bind(fields.low_stock_threshold)
        .bind(fields.warranty_months)
        .bind(fields.description)
        .bind(fields.brand)
        .bind(fields.model)
        .bind(fields.image_url)
        .bind(Utc::now())
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn deactivate_product<'e, E>(&self, executor: E, id: i64) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE products SET active = 0, updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
