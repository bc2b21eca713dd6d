use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::access::CurrentUser;
use crate::errors::AppError;
use crate::models::appointment::{Appointment, AppointmentStatus, NewAppointment};
use crate::models::dashboard::ClientSummary;
use crate::models::notification::Notification;
use crate::models::service::Service;
use crate::repo;
use crate::state::AppState;
use crate::validation::validate_booking_time;

const UPCOMING_LIMIT: i64 = 5;

/// GET /dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(client): Extension<CurrentUser>,
) -> Result<Json<ClientSummary>, AppError> {
    let upcoming_appointments =
        repo::appointments::upcoming_for_client(&state.db, client.id, UPCOMING_LIMIT).await?;
    let unread_notifications = repo::notifications::unread_count(&state.db, client.id).await?;
    Ok(Json(ClientSummary {
        upcoming_appointments,
        unread_notifications,
    }))
}

/// GET /dashboard/services
pub async fn list_services(State(state): State<AppState>) -> Result<Json<Vec<Service>>, AppError> {
    Ok(Json(repo::services::list_services(&state.db, true).await?))
}

/// GET /dashboard/appointments
pub async fn list_appointments(
    State(state): State<AppState>,
    Extension(client): Extension<CurrentUser>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    Ok(Json(
        repo::appointments::list_for_client(&state.db, client.id).await?,
    ))
}

/// POST /dashboard/appointments
pub async fn book_appointment(
    State(state): State<AppState>,
    Extension(client): Extension<CurrentUser>,
    Json(req): Json<NewAppointment>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    validate_booking_time(req.scheduled_at, Utc::now())?;
    let service = repo::services::get_service(&state.db, req.service_id)
        .await?
        .filter(|s| s.is_active)
        .ok_or_else(|| AppError::Validation(format!("service {} is not available", req.service_id)))?;
    if let Some(worker_id) = req.worker_id {
        let bookable = repo::users::access_profile(&state.db, worker_id)
            .await?
            .is_some_and(|p| p.is_bookable_worker());
        if !bookable {
            return Err(AppError::Validation(format!(
                "worker {worker_id} is not available"
            )));
        }
    }

    let appointment = repo::appointments::create(&state.db, client.id, &req).await?;
    info!(
        "Client {} booked {} for {}",
        client.id, service.name, appointment.scheduled_at
    );
    Ok((StatusCode::CREATED, Json(appointment)))
}

/// POST /dashboard/appointments/:id/cancel
pub async fn cancel_appointment(
    State(state): State<AppState>,
    Extension(client): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, AppError> {
    let appointment = repo::appointments::get(&state.db, id)
        .await?
        .filter(|a| a.client_id == client.id)
        .ok_or_else(|| AppError::NotFound(format!("Appointment {id} not found")))?;

    let cancellable = AppointmentStatus::parse(&appointment.status)
        .is_some_and(|s| s.can_transition_to(AppointmentStatus::Cancelled));
    if !cancellable {
        return Err(AppError::Conflict(format!(
            "appointment is already {}",
            appointment.status
        )));
    }

    let updated = repo::appointments::set_status(&state.db, id, AppointmentStatus::Cancelled)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Appointment {id} not found")))?;
    Ok(Json(updated))
}

/// GET /dashboard/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(client): Extension<CurrentUser>,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(
        repo::notifications::list_for_user(&state.db, client.id).await?,
    ))
}

/// POST /dashboard/notifications/:id/read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(client): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !repo::notifications::mark_read(&state.db, client.id, id).await? {
        return Err(AppError::NotFound(format!("Notification {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
