use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::product::{InventoryItem, NewProduct, Product, ProductUpdate};

const PRODUCT_COLUMNS: &str = "id, name, description, price::float8 AS price, stock_quantity, \
     min_stock_level, image_url, is_active, created_at, updated_at";

pub async fn list_products(pool: &PgPool, active_only: bool) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active OR NOT $1 ORDER BY name"
    ))
    .bind(active_only)
    .fetch_all(pool)
    .await
}

pub async fn get_product(pool: &PgPool, id: Uuid) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Inserts through the `create_product` procedure, which also seeds the
/// stock-movement history on the database side.
pub async fn create_product(pool: &PgPool, new: &NewProduct) -> Result<Product, sqlx::Error> {
    let id: Uuid = sqlx::query_scalar("SELECT create_product($1, $2, $3::numeric, $4, $5)")
        .bind(new.name.trim())
        .bind(&new.description)
        .bind(new.price)
        .bind(new.stock_quantity)
        .bind(new.min_stock_level)
        .fetch_one(pool)
        .await?;
    info!("Created product {id}");

    get_product(pool, id).await?.ok_or(sqlx::Error::RowNotFound)
}

pub async fn update_product(
    pool: &PgPool,
    id: Uuid,
    update: &ProductUpdate,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        r#"
        UPDATE products
        SET name = COALESCE($2, name),
            description = COALESCE($3, description),
            price = COALESCE($4::numeric, price),
            stock_quantity = COALESCE($5, stock_quantity),
            min_stock_level = COALESCE($6, min_stock_level),
            is_active = COALESCE($7, is_active),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {PRODUCT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(update.name.as_deref().map(str::trim))
    .bind(&update.description)
    .bind(update.price)
    .bind(update.stock_quantity)
    .bind(update.min_stock_level)
    .bind(update.is_active)
    .fetch_optional(pool)
    .await
}

pub async fn set_image_url(
    pool: &PgPool,
    id: Uuid,
    image_url: &str,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(&format!(
        "UPDATE products SET image_url = $2, updated_at = NOW() WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(id)
    .bind(image_url)
    .fetch_optional(pool)
    .await
}

/// Products are referenced by past sales, so deletion only deactivates.
pub async fn deactivate_product(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn inventory(pool: &PgPool) -> Result<Vec<InventoryItem>, sqlx::Error> {
    sqlx::query_as::<_, InventoryItem>(
        "SELECT id, name, stock_quantity, min_stock_level, is_low_stock FROM get_inventory_items()",
    )
    .fetch_all(pool)
    .await
}
