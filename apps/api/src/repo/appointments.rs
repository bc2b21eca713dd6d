use sqlx::PgPool;
use uuid::Uuid;

use crate::models::appointment::{Appointment, AppointmentStatus, NewAppointment};

const APPOINTMENT_COLUMNS: &str =
    "id, client_id, worker_id, service_id, scheduled_at, status, notes, created_at, updated_at";

pub async fn list_all(pool: &PgPool) -> Result<Vec<Appointment>, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments ORDER BY scheduled_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn list_for_client(pool: &PgPool, client_id: Uuid) -> Result<Vec<Appointment>, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE client_id = $1 ORDER BY scheduled_at DESC"
    ))
    .bind(client_id)
    .fetch_all(pool)
    .await
}

/// The worker's own appointments plus pending ones nobody has claimed yet.
pub async fn list_for_worker(pool: &PgPool, worker_id: Uuid) -> Result<Vec<Appointment>, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(&format!(
        r#"
        SELECT {APPOINTMENT_COLUMNS} FROM appointments
        WHERE worker_id = $1 OR (worker_id IS NULL AND status = 'pending')
        ORDER BY scheduled_at
        "#
    ))
    .bind(worker_id)
    .fetch_all(pool)
    .await
}

pub async fn worker_today(pool: &PgPool, worker_id: Uuid) -> Result<Vec<Appointment>, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(&format!(
        r#"
        SELECT {APPOINTMENT_COLUMNS} FROM appointments
        WHERE worker_id = $1 AND scheduled_at::date = CURRENT_DATE AND status <> 'cancelled'
        ORDER BY scheduled_at
        "#
    ))
    .bind(worker_id)
    .fetch_all(pool)
    .await
}

pub async fn upcoming_for_client(
    pool: &PgPool,
    client_id: Uuid,
    limit: i64,
) -> Result<Vec<Appointment>, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(&format!(
        r#"
        SELECT {APPOINTMENT_COLUMNS} FROM appointments
        WHERE client_id = $1 AND scheduled_at >= NOW() AND status IN ('pending', 'confirmed')
        ORDER BY scheduled_at
        LIMIT $2
        "#
    ))
    .bind(client_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<Appointment>, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    client_id: Uuid,
    new: &NewAppointment,
) -> Result<Appointment, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(&format!(
        r#"
        INSERT INTO appointments (client_id, worker_id, service_id, scheduled_at, status, notes)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    ))
    .bind(client_id)
    .bind(new.worker_id)
    .bind(new.service_id)
    .bind(new.scheduled_at)
    .bind(AppointmentStatus::Pending.as_str())
    .bind(&new.notes)
    .fetch_one(pool)
    .await
}

pub async fn set_status(
    pool: &PgPool,
    id: Uuid,
    status: AppointmentStatus,
) -> Result<Option<Appointment>, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(&format!(
        "UPDATE appointments SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {APPOINTMENT_COLUMNS}"
    ))
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await
}

/// Moves an appointment on behalf of a worker, assigning it to them when it
/// was still unassigned. `None` when another worker got there first.
pub async fn set_status_as_worker(
    pool: &PgPool,
    id: Uuid,
    worker_id: Uuid,
    status: AppointmentStatus,
) -> Result<Option<Appointment>, sqlx::Error> {
    sqlx::query_as::<_, Appointment>(&format!(
        r#"
        UPDATE appointments
        SET status = $3, worker_id = COALESCE(worker_id, $2), updated_at = NOW()
        WHERE id = $1 AND (worker_id = $2 OR worker_id IS NULL)
        RETURNING {APPOINTMENT_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(worker_id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await
}
