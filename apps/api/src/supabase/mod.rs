//! Supabase Auth (GoTrue) client, the only place that talks to the hosted
//! identity provider. Sessions are created, refreshed and revoked there; this
//! client only asks about them.
//!
//! Calls are never retried: a failed lookup fails the current navigation.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::access::{AuthUser, SessionProvider};

const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid login credentials")]
    InvalidCredentials,
}

/// Session returned by a successful password grant.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseAuth {
    pub fn new(base_url: &str, anon_key: String) -> Result<Self, SupabaseError> {
        let client = Client::builder()
            .user_agent(concat!("salon-api/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    /// Resolves an access token to its user. `Ok(None)` when the provider
    /// rejects the token (expired, revoked, malformed).
    pub async fn get_user(&self, access_token: &str) -> Result<Option<AuthUser>, SupabaseError> {
        let response = self
            .client
            .get(self.endpoint("user"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            debug!("Access token rejected by auth provider ({status})");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }
        Ok(Some(response.json().await?))
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, SupabaseError> {
        let response = self
            .client
            .post(self.endpoint("token?grant_type=password"))
            .header("apikey", &self.anon_key)
            .json(&PasswordGrant { email, password })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            debug!("Password grant refused: {}", error_message(&body));
            return Err(SupabaseError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }
        Ok(response.json().await?)
    }

    /// Registers a new account. Profile fields travel as user metadata; the
    /// `users` row (role `client`) is created by the database on confirmation.
    pub async fn sign_up(&self, req: &SignUpRequest) -> Result<(), SupabaseError> {
        let body = json!({
            "email": req.email,
            "password": req.password,
            "data": {
                "full_name": req.full_name,
                "phone": req.phone,
            }
        });
        let response = self
            .client
            .post(self.endpoint("signup"))
            .header("apikey", &self.anon_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }
        Ok(())
    }

    /// Revokes the session behind `access_token`. An already-dead token is not an error.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), SupabaseError> {
        let response = self
            .client
            .post(self.endpoint("logout"))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() || status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(api_error(status, response).await)
    }
}

#[async_trait]
impl SessionProvider for SupabaseAuth {
    async fn current_user(&self, access_token: &str) -> anyhow::Result<Option<AuthUser>> {
        Ok(self.get_user(access_token).await?)
    }

    async fn sign_out(&self, access_token: &str) -> anyhow::Result<()> {
        Ok(SupabaseAuth::sign_out(self, access_token).await?)
    }
}

/// Account operations the auth routes need from the provider.
#[async_trait]
pub trait AccountProvider: Send + Sync {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, SupabaseError>;

    async fn sign_up(&self, req: &SignUpRequest) -> Result<(), SupabaseError>;
}

#[async_trait]
impl AccountProvider for SupabaseAuth {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, SupabaseError> {
        SupabaseAuth::sign_in_with_password(self, email, password).await
    }

    async fn sign_up(&self, req: &SignUpRequest) -> Result<(), SupabaseError> {
        SupabaseAuth::sign_up(self, req).await
    }
}

async fn api_error(status: StatusCode, response: reqwest::Response) -> SupabaseError {
    let body = response.text().await.unwrap_or_default();
    warn!("Auth provider returned {status}: {body}");
    SupabaseError::Api {
        status: status.as_u16(),
        message: error_message(&body),
    }
}

/// GoTrue reports errors under several keys depending on the endpoint and version.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_description() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(error_message(body), "Invalid login credentials");
    }

    #[test]
    fn test_error_message_msg_key() {
        let body = r#"{"code":422,"msg":"User already registered"}"#;
        assert_eq!(error_message(body), "User already registered");
    }

    #[test]
    fn test_error_message_falls_back_to_raw_body() {
        assert_eq!(error_message("upstream timeout"), "upstream timeout");
        assert_eq!(error_message(r#"{"code":500}"#), r#"{"code":500}"#);
    }

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let auth = SupabaseAuth::new("https://abc.supabase.co/", "anon".into()).unwrap();
        assert_eq!(auth.endpoint("user"), "https://abc.supabase.co/auth/v1/user");
    }

    #[test]
    fn test_session_deserializes_from_provider_payload() {
        let payload = r#"{
            "access_token": "at",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "rt",
            "user": {"id": "6f1c0c8e-4a8b-4f57-9d59-2d1b7a3f0e11", "email": "ana@salon.test", "aud": "authenticated"}
        }"#;
        let session: AuthSession = serde_json::from_str(payload).unwrap();
        assert_eq!(session.expires_in, 3600);
        assert_eq!(session.user.email.as_deref(), Some("ana@salon.test"));
    }
}
