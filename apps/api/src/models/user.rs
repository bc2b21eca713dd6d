use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::access::Role;

/// A row of the `users` table. `role` stays raw text: rows with an unknown
/// role still load and are rejected by the access gate instead.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The two columns every routing decision depends on.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct AccessProfile {
    pub role: String,
    pub is_active: bool,
}

impl AccessProfile {
    /// Whether clients may book this user as their stylist.
    pub fn is_bookable_worker(&self) -> bool {
        self.is_active && Role::parse(&self.role) == Some(Role::Worker)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserUpdate {
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(role: &str, is_active: bool) -> AccessProfile {
        AccessProfile {
            role: role.to_string(),
            is_active,
        }
    }

    #[test]
    fn test_only_active_workers_are_bookable() {
        assert!(profile("worker", true).is_bookable_worker());
        assert!(!profile("worker", false).is_bookable_worker());
        assert!(!profile("client", true).is_bookable_worker());
        assert!(!profile("admin", true).is_bookable_worker());
        assert!(!profile("Worker", true).is_bookable_worker());
    }
}
