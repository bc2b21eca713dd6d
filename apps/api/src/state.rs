use std::sync::Arc;

use sqlx::PgPool;

use crate::access::AccessGate;
use crate::storage::ImageStore;
use crate::supabase::AccountProvider;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub auth: Arc<dyn AccountProvider>,
    pub images: ImageStore,
    pub gate: AccessGate,
}
