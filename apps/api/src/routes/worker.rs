use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::access::CurrentUser;
use crate::errors::AppError;
use crate::models::appointment::{Appointment, AppointmentStatus, StatusUpdate};
use crate::models::dashboard::WorkerSummary;
use crate::models::product::Product;
use crate::models::sale::{NewSale, Sale};
use crate::repo;
use crate::state::AppState;
use crate::validation::validate_sale;

/// GET /worker/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(worker): Extension<CurrentUser>,
) -> Result<Json<WorkerSummary>, AppError> {
    let appointments_today = repo::appointments::worker_today(&state.db, worker.id).await?;
    let sales_today = repo::sales::worker_total_today(&state.db, worker.id).await?;
    Ok(Json(WorkerSummary {
        appointments_today,
        sales_today,
    }))
}

/// GET /worker/appointments
pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(worker): Extension<CurrentUser>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    Ok(Json(
        repo::appointments::list_for_worker(&state.db, worker.id).await?,
    ))
}

/// PATCH /worker/appointments/:id/status
/// Confirming an unassigned appointment claims it for the calling worker.
pub async fn update_appointment_status(
    State(state): State<AppState>,
    Extension(worker): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusUpdate>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = repo::appointments::get(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Appointment {id} not found")))?;
    check_status_change(&appointment, worker.id, req.status)?;

    let updated = repo::appointments::set_status_as_worker(&state.db, id, worker.id, req.status)
        .await?
        .ok_or_else(|| AppError::Conflict(format!("appointment {id} was taken by another worker")))?;
    info!("Worker {} moved appointment {id} to {}", worker.id, req.status);

    let message = format!(
        "Your appointment on {} is now {}.",
        updated.scheduled_at.format("%Y-%m-%d %H:%M"),
        req.status
    );
    if let Err(e) =
        repo::notifications::notify(&state.db, updated.client_id, "Appointment update", &message)
            .await
    {
        warn!("Could not notify client {}: {e}", updated.client_id);
    }
    Ok(Json(updated))
}

/// A worker may move their own appointments, or claim an unassigned one by confirming it.
fn check_status_change(
    appointment: &Appointment,
    worker_id: Uuid,
    next: AppointmentStatus,
) -> Result<(), AppError> {
    let allowed = match appointment.worker_id {
        Some(assigned) => assigned == worker_id,
        None => next == AppointmentStatus::Confirmed,
    };
    if !allowed {
        return Err(AppError::NotFound(format!(
            "Appointment {} not found",
            appointment.id
        )));
    }

    let current = AppointmentStatus::parse(&appointment.status).ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "appointment {} has unknown status '{}'",
            appointment.id,
            appointment.status
        ))
    })?;
    if !current.can_transition_to(next) {
        return Err(AppError::Conflict(format!(
            "cannot move appointment from {current} to {next}"
        )));
    }
    Ok(())
}

/// GET /worker/products
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(repo::products::list_products(&state.db, true).await?))
}

/// POST /worker/sales
pub async fn create_sale(
    State(state): State<AppState>,
    Extension(worker): Extension<CurrentUser>,
    Json(req): Json<NewSale>,
) -> Result<(StatusCode, Json<Sale>), AppError> {
    validate_sale(&req)?;
    let sale = repo::sales::process_sale(&state.db, worker.id, &req).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn appointment(worker_id: Option<Uuid>, status: &str) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            worker_id,
            service_id: Uuid::new_v4(),
            scheduled_at: Utc::now(),
            status: status.to_string(),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_assigned_worker_moves_own_appointment() {
        let me = Uuid::new_v4();
        let a = appointment(Some(me), "confirmed");
        assert!(check_status_change(&a, me, AppointmentStatus::Completed).is_ok());
        assert!(matches!(
            check_status_change(&a, me, AppointmentStatus::Pending),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn test_other_workers_appointment_is_hidden() {
        let a = appointment(Some(Uuid::new_v4()), "pending");
        assert!(matches!(
            check_status_change(&a, Uuid::new_v4(), AppointmentStatus::Confirmed),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_unassigned_appointment_claimed_by_confirming() {
        let me = Uuid::new_v4();
        let a = appointment(None, "pending");
        assert!(check_status_change(&a, me, AppointmentStatus::Confirmed).is_ok());
        assert!(matches!(
            check_status_change(&a, me, AppointmentStatus::Cancelled),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_unknown_stored_status_is_internal() {
        let me = Uuid::new_v4();
        let a = appointment(Some(me), "on-hold");
        assert!(matches!(
            check_status_change(&a, me, AppointmentStatus::Confirmed),
            Err(AppError::Internal(_))
        ));
    }
}
