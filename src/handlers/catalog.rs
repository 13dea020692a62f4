// src/handlers/catalog.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{PermAdjustStock, PermDeleteCatalog, PermWriteCatalog, RequirePermission},
    models::{
        auth::MessageResponse,
        catalog::{Category, CategoryPayload, CreateProductPayload, Product, ProductFilter, UpdateProductPayload},
        stock::{AdjustStockPayload, ProductMovements},
    },
};

// =============================================================================
// Categories
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Catalog",
    responses(
        (status = 200, description = "Active categories ordered by name", body = Vec<Category>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_categories(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let categories = app_state.catalog_service.list_categories().await?;
    Ok((StatusCode::OK, Json(categories)))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Catalog",
    request_body = CategoryPayload,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 403, description = "Admin or staff only"),
        (status = 409, description = "Name already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermWriteCatalog>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let category = app_state.catalog_service.create_category(&payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    tag = "Catalog",
    params(("id" = i64, Path, description = "Category id")),
    request_body = CategoryPayload,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 404, description = "Unknown category"),
        (status = 409, description = "Name already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_category(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermWriteCatalog>,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let category = app_state.catalog_service.update_category(id, &payload).await?;
    Ok((StatusCode::OK, Json(category)))
}

#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    tag = "Catalog",
    params(("id" = i64, Path, description = "Category id")),
    responses(
        (status = 200, description = "Category deactivated", body = MessageResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Unknown category")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_category(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermDeleteCatalog>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.catalog_service.deactivate_category(id).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("Category deleted successfully"))))
}

// =============================================================================
// Products
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Catalog",
    params(ProductFilter),
    responses(
        (status = 200, description = "Active products with their category", body = Vec<Product>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    Query(filter): Query<ProductFilter>,
) -> Result<impl IntoResponse, AppError> {
    let products = app_state.catalog_service.list_products(&filter).await?;
    Ok((StatusCode::OK, Json(products)))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Catalog",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "The product", body = Product),
        (status = 404, description = "Unknown product")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let product = app_state.catalog_service.get_product(id).await?;
    Ok((StatusCode::OK, Json(product)))
}

#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Catalog",
    request_body = CreateProductPayload,
    responses(
        (status = 201, description = "Product created, opening stock recorded", body = Product),
        (status = 400, description = "Invalid payload or inactive category"),
        (status = 403, description = "Admin or staff only")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    RequirePermission(user, _): RequirePermission<PermWriteCatalog>,
    Json(payload): Json<CreateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let product = app_state.catalog_service.create_product(&payload, user.id).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Catalog",
    params(("id" = i64, Path, description = "Product id")),
    request_body = UpdateProductPayload,
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 404, description = "Unknown product")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    RequirePermission(user, _): RequirePermission<PermWriteCatalog>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let product = app_state.catalog_service.update_product(id, &payload, user.id).await?;
    Ok((StatusCode::OK, Json(product)))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Catalog",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deactivated", body = MessageResponse),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Unknown product")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    _guard: RequirePermission<PermDeleteCatalog>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    app_state.catalog_service.deactivate_product(id).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("Product deleted successfully"))))
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/adjust-stock",
    tag = "Catalog",
    params(("id" = i64, Path, description = "Product id")),
    request_body = AdjustStockPayload,
    responses(
        (status = 200, description = "Adjustment recorded", body = Product),
        (status = 404, description = "Unknown product"),
        (status = 409, description = "Stock would go negative")
    ),
    security(("api_jwt" = []))
)]
pub async fn adjust_stock(
    State(app_state): State<AppState>,
    RequirePermission(user, _): RequirePermission<PermAdjustStock>,
    Path(id): Path<i64>,
    Json(payload): Json<AdjustStockPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let product = app_state.catalog_service.adjust_stock(id, &payload, user.id).await?;
    Ok((StatusCode::OK, Json(product)))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}/movements",
    tag = "Catalog",
    params(("id" = i64, Path, description = "Product id")),
    responses(
        (status = 200, description = "Stock ledger with the derived stock", body = ProductMovements),
        (status = 404, description = "Unknown product")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let movements = app_state.catalog_service.movements(id).await?;
    Ok((StatusCode::OK, Json(movements)))
}
