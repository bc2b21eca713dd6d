use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;
use uuid::Uuid;

use crate::access::{CurrentUser, Role};
use crate::errors::AppError;
use crate::models::appointment::Appointment;
use crate::models::dashboard::AdminSummary;
use crate::models::product::{InventoryItem, NewProduct, Product, ProductUpdate};
use crate::models::sale::Sale;
use crate::models::service::{NewService, Service, ServiceUpdate};
use crate::models::user::{User, UserUpdate};
use crate::repo;
use crate::state::AppState;
use crate::validation::{
    validate_new_product, validate_new_service, validate_product_update, validate_service_update,
};

/// GET /admin/dashboard
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<AdminSummary>, AppError> {
    Ok(Json(repo::dashboard::admin_summary(&state.db).await?))
}

/// GET /admin/users
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(repo::users::list_users(&state.db).await?))
}

/// PATCH /admin/users/:id
pub async fn update_user(
    State(state): State<AppState>,
    Extension(admin): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UserUpdate>,
) -> Result<Json<User>, AppError> {
    let role = match req.role.as_deref() {
        Some(raw) => Some(
            Role::parse(raw)
                .ok_or_else(|| AppError::Validation(format!("unknown role '{raw}'")))?,
        ),
        None => None,
    };
    if id == admin.id && (req.is_active == Some(false) || role.is_some_and(|r| r != Role::Admin)) {
        return Err(AppError::Conflict(
            "admins cannot demote or deactivate their own account".into(),
        ));
    }

    let user = repo::users::update_access(&state.db, id, role.map(|r| r.as_str()), req.is_active)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;
    info!(
        "Admin {} set user {id} to role={} active={}",
        admin.id, user.role, user.is_active
    );
    Ok(Json(user))
}

/// GET /admin/services
pub async fn list_services(State(state): State<AppState>) -> Result<Json<Vec<Service>>, AppError> {
    Ok(Json(repo::services::list_services(&state.db, false).await?))
}

/// POST /admin/services
pub async fn create_service(
    State(state): State<AppState>,
    Json(req): Json<NewService>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    validate_new_service(&req)?;
    let service = repo::services::create_service(&state.db, &req).await?;
    Ok((StatusCode::CREATED, Json(service)))
}

/// PATCH /admin/services/:id
pub async fn update_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ServiceUpdate>,
) -> Result<Json<Service>, AppError> {
    validate_service_update(&req)?;
    let service = repo::services::update_service(&state.db, id, &req)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Service {id} not found")))?;
    Ok(Json(service))
}

/// DELETE /admin/services/:id
/// Soft delete: booked appointments keep their service.
pub async fn delete_service(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !repo::services::deactivate_service(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Service {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /admin/products
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(repo::products::list_products(&state.db, false).await?))
}

/// POST /admin/products
pub async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    validate_new_product(&req)?;
    let product = repo::products::create_product(&state.db, &req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PATCH /admin/products/:id
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ProductUpdate>,
) -> Result<Json<Product>, AppError> {
    validate_product_update(&req)?;
    let product = repo::products::update_product(&state.db, id, &req)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))?;
    Ok(Json(product))
}

/// DELETE /admin/products/:id
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !repo::products::deactivate_product(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Product {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/products/:id/image
/// Multipart body with a single `file` field.
pub async fn upload_product_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<Product>, AppError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("could not read upload: {e}")))?;
        upload = Some((content_type, data));
        break;
    }
    let (content_type, data) =
        upload.ok_or_else(|| AppError::Validation("missing 'file' field".into()))?;

    if repo::products::get_product(&state.db, id).await?.is_none() {
        return Err(AppError::NotFound(format!("Product {id} not found")));
    }
    let url = state
        .images
        .upload_product_image(id, &content_type, data)
        .await?;
    let product = repo::products::set_image_url(&state.db, id, &url)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))?;
    Ok(Json(product))
}

/// GET /admin/inventory
pub async fn inventory(State(state): State<AppState>) -> Result<Json<Vec<InventoryItem>>, AppError> {
    Ok(Json(repo::products::inventory(&state.db).await?))
}

/// GET /admin/appointments
pub async fn list_appointments(
    State(state): State<AppState>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    Ok(Json(repo::appointments::list_all(&state.db).await?))
}

/// GET /admin/sales
pub async fn list_sales(State(state): State<AppState>) -> Result<Json<Vec<Sale>>, AppError> {
    Ok(Json(repo::sales::list_all(&state.db).await?))
}
