use sqlx::PgPool;

use crate::models::dashboard::AdminSummary;

pub async fn admin_summary(pool: &PgPool) -> Result<AdminSummary, sqlx::Error> {
    sqlx::query_as::<_, AdminSummary>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users) AS total_users,
            (SELECT COUNT(*) FROM appointments
                WHERE scheduled_at::date = CURRENT_DATE AND status <> 'cancelled') AS appointments_today,
            (SELECT COUNT(*) FROM products
                WHERE is_active AND stock_quantity <= min_stock_level) AS low_stock_products,
            (SELECT COALESCE(SUM(total_amount), 0)::float8 FROM sales
                WHERE created_at::date = CURRENT_DATE) AS sales_today
        "#,
    )
    .fetch_one(pool)
    .await
}
