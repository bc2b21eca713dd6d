use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{AccessProfile, User};

const USER_COLUMNS: &str =
    "id, email, full_name, phone, role, is_active, created_at, updated_at";

pub async fn list_users(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn access_profile(pool: &PgPool, id: Uuid) -> Result<Option<AccessProfile>, sqlx::Error> {
    sqlx::query_as::<_, AccessProfile>("SELECT role, is_active FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Changes role and/or active flag. The next navigation of that user picks
/// the change up through the access gate.
pub async fn update_access(
    pool: &PgPool,
    id: Uuid,
    role: Option<&str>,
    is_active: Option<bool>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET role = COALESCE($2, role),
            is_active = COALESCE($3, is_active),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(role)
    .bind(is_active)
    .fetch_optional(pool)
    .await
}

/// Lets the database count the failure and lock the account when needed.
pub async fn record_failed_login(pool: &PgPool, email: &str) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT handle_failed_login($1)")
        .bind(email)
        .execute(pool)
        .await?;
    Ok(())
}
