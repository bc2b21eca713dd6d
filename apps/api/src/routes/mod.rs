pub mod admin;
pub mod auth;
pub mod client;
pub mod health;
pub mod worker;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};

use crate::access::require_access;
use crate::state::AppState;
use crate::storage::MAX_IMAGE_BYTES;

/// Builds the full router. Every route sits behind the access gate, which
/// decides from the path alone whether and for which role it applies.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth pages and actions
        .route("/auth/sign-in", get(auth::sign_in_page).post(auth::sign_in))
        .route("/auth/sign-up", get(auth::sign_up_page).post(auth::sign_up))
        .route("/auth/sign-out", post(auth::sign_out))
        .merge(admin_routes())
        .merge(worker_routes())
        .merge(client_routes())
        .layer(from_fn_with_state(state.gate.clone(), require_access))
        .with_state(state)
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/dashboard", get(admin::dashboard))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/:id", patch(admin::update_user))
        .route(
            "/admin/services",
            get(admin::list_services).post(admin::create_service),
        )
        .route(
            "/admin/services/:id",
            patch(admin::update_service).delete(admin::delete_service),
        )
        .route(
            "/admin/products",
            get(admin::list_products).post(admin::create_product),
        )
        .route(
            "/admin/products/:id",
            patch(admin::update_product).delete(admin::delete_product),
        )
        .route(
            "/admin/products/:id/image",
            post(admin::upload_product_image)
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024)),
        )
        .route("/admin/inventory", get(admin::inventory))
        .route("/admin/appointments", get(admin::list_appointments))
        .route("/admin/sales", get(admin::list_sales))
}

fn worker_routes() -> Router<AppState> {
    Router::new()
        .route("/worker/dashboard", get(worker::dashboard))
        .route("/worker/appointments", get(worker::list_appointments))
        .route(
            "/worker/appointments/:id/status",
            patch(worker::update_appointment_status),
        )
        .route("/worker/products", get(worker::list_products))
        .route("/worker/sales", post(worker::create_sale))
}

fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(client::dashboard))
        .route("/dashboard/services", get(client::list_services))
        .route(
            "/dashboard/appointments",
            get(client::list_appointments).post(client::book_appointment),
        )
        .route(
            "/dashboard/appointments/:id/cancel",
            post(client::cancel_appointment),
        )
        .route("/dashboard/notifications", get(client::list_notifications))
        .route(
            "/dashboard/notifications/:id/read",
            post(client::mark_notification_read),
        )
}
