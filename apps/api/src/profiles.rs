use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::access::ProfileStore;
use crate::models::user::AccessProfile;
use crate::repo;

/// Reads `{role, is_active}` straight from the `users` table and reports
/// failed logins to `handle_failed_login`.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn fetch_access_profile(&self, user_id: Uuid) -> Result<Option<AccessProfile>> {
        Ok(repo::users::access_profile(&self.pool, user_id).await?)
    }

    async fn record_failed_login(&self, email: &str) -> Result<()> {
        Ok(repo::users::record_failed_login(&self.pool, email).await?)
    }
}
