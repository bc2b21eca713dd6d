use sqlx::PgPool;
use uuid::Uuid;

use crate::models::service::{NewService, Service, ServiceUpdate};

const SERVICE_COLUMNS: &str = "id, name, description, duration_minutes, price::float8 AS price, \
     is_active, created_at, updated_at";

pub async fn list_services(pool: &PgPool, active_only: bool) -> Result<Vec<Service>, sqlx::Error> {
    sqlx::query_as::<_, Service>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE is_active OR NOT $1 ORDER BY name"
    ))
    .bind(active_only)
    .fetch_all(pool)
    .await
}

pub async fn get_service(pool: &PgPool, id: Uuid) -> Result<Option<Service>, sqlx::Error> {
    sqlx::query_as::<_, Service>(&format!(
        "SELECT {SERVICE_COLUMNS} FROM services WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn create_service(pool: &PgPool, new: &NewService) -> Result<Service, sqlx::Error> {
    sqlx::query_as::<_, Service>(&format!(
        r#"
        INSERT INTO services (name, description, duration_minutes, price)
        VALUES ($1, $2, $3, $4::numeric)
        RETURNING {SERVICE_COLUMNS}
        "#
    ))
    .bind(new.name.trim())
    .bind(&new.description)
    .bind(new.duration_minutes)
    .bind(new.price)
    .fetch_one(pool)
    .await
}

pub async fn update_service(
    pool: &PgPool,
    id: Uuid,
    update: &ServiceUpdate,
) -> Result<Option<Service>, sqlx::Error> {
    sqlx::query_as::<_, Service>(&format!(
        r#"
        UPDATE services
        SET name = COALESCE($2, name),
            description = COALESCE($3, description),
            duration_minutes = COALESCE($4, duration_minutes),
            price = COALESCE($5::numeric, price),
            is_active = COALESCE($6, is_active),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {SERVICE_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(update.name.as_deref().map(str::trim))
    .bind(&update.description)
    .bind(update.duration_minutes)
    .bind(update.price)
    .bind(update.is_active)
    .fetch_optional(pool)
    .await
}

/// Appointments keep pointing at their service, so deletion only hides it
/// from booking. Returns false when no row matched.
pub async fn deactivate_service(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE services SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}
