use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::sale::{NewSale, Sale};

const SALE_COLUMNS: &str =
    "id, worker_id, client_id, total_amount::float8 AS total_amount, payment_method, created_at";

pub async fn list_all(pool: &PgPool) -> Result<Vec<Sale>, sqlx::Error> {
    sqlx::query_as::<_, Sale>(&format!(
        "SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

/// Records a sale through `process_sale`, which checks and decrements stock
/// for every line in a single transaction and fails the whole sale otherwise.
pub async fn process_sale(pool: &PgPool, worker_id: Uuid, sale: &NewSale) -> Result<Sale, sqlx::Error> {
    let id: Uuid = sqlx::query_scalar("SELECT process_sale($1, $2, $3, $4)")
        .bind(worker_id)
        .bind(sale.client_id)
        .bind(sale.payment_method.trim())
        .bind(Json(&sale.items))
        .fetch_one(pool)
        .await?;
    info!("Worker {worker_id} recorded sale {id} ({} lines)", sale.items.len());

    sqlx::query_as::<_, Sale>(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn worker_total_today(pool: &PgPool, worker_id: Uuid) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(total_amount), 0)::float8
        FROM sales
        WHERE worker_id = $1 AND created_at::date = CURRENT_DATE
        "#,
    )
    .bind(worker_id)
    .fetch_one(pool)
    .await
}
