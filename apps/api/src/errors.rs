use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::supabase::SupabaseError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Access-control failures never reach this type: the access gate turns them
/// into redirects before a handler runs.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Auth provider error: {0}")]
    Provider(#[from] SupabaseError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Business rules enforced inside Postgres (procedure `RAISE EXCEPTION`,
/// CHECK and FK constraints) are the caller's fault, not an outage.
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &e {
            if let Some(rejected) = rejection(db.code().as_deref(), db.message()) {
                tracing::info!("Database rejected request: {}", db.message());
                return rejected;
            }
        }
        AppError::Database(e)
    }
}

/// Maps a SQLSTATE to the client-facing error it stands for.
fn rejection(code: Option<&str>, message: &str) -> Option<AppError> {
    match code? {
        // raise_exception: procedure messages are written for users
        "P0001" => Some(AppError::Validation(message.to_string())),
        "23514" => Some(AppError::Validation(
            "a value is outside the allowed range".to_string(),
        )),
        "23503" => Some(AppError::Conflict(
            "the record references or is referenced by other data".to_string(),
        )),
        "23505" => Some(AppError::Conflict(
            "a record with the same value already exists".to_string(),
        )),
        _ => None,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Provider(e) => {
                tracing::error!("Auth provider error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "AUTH_PROVIDER_ERROR",
                    "The authentication service is unavailable".to_string(),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(res: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_shape() {
        let res = AppError::Validation("price must not be negative".into()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "price must not be negative");
    }

    #[tokio::test]
    async fn test_procedure_exception_is_a_client_error() {
        let err = rejection(Some("P0001"), "Insufficient stock for product Wax").unwrap();
        let res = err.into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = body_json(res).await;
        assert_eq!(body["error"]["message"], "Insufficient stock for product Wax");
    }

    #[test]
    fn test_constraint_violations_map_to_conflict_or_validation() {
        assert!(matches!(
            rejection(Some("23503"), "violates foreign key constraint"),
            Some(AppError::Conflict(_))
        ));
        assert!(matches!(
            rejection(Some("23505"), "duplicate key value"),
            Some(AppError::Conflict(_))
        ));
        assert!(matches!(
            rejection(Some("23514"), "violates check constraint"),
            Some(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_other_database_errors_stay_internal() {
        assert!(rejection(Some("57P01"), "terminating connection").is_none());
        assert!(rejection(None, "no code").is_none());
        assert!(matches!(
            AppError::from(sqlx::Error::PoolTimedOut),
            AppError::Database(_)
        ));
    }

    #[tokio::test]
    async fn test_internal_errors_are_not_leaked() {
        let res = AppError::Internal(anyhow::anyhow!("password=hunter2")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(res).await;
        assert!(!body.to_string().contains("hunter2"));
    }
}
