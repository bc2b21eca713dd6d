use sqlx::PgPool;
use uuid::Uuid;

use crate::models::notification::Notification;

pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, user_id, title, message, is_read, created_at
        FROM notifications
        WHERE user_id = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn unread_count(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read")
        .bind(user_id)
        .fetch_one(pool)
        .await
}

/// Scoped to the owner, so another user's id simply matches nothing.
pub async fn mark_read(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn notify(pool: &PgPool, user_id: Uuid, title: &str, message: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO notifications (user_id, title, message) VALUES ($1, $2, $3)")
        .bind(user_id)
        .bind(title)
        .bind(message)
        .execute(pool)
        .await?;
    Ok(())
}
