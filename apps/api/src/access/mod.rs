//! Role-based access control applied to every route.
//!
//! Every request is classified by path into a [`RouteAccess`], then the
//! [`AccessGate`] resolves the session and the user's `{role, is_active}`
//! into a [`GateOutcome`]. The decision steps are plain functions so they
//! can be tested without a provider or a database.

use std::fmt;

use axum::http::Method;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::models::user::AccessProfile;

pub mod cookies;
pub mod gate;
pub mod middleware;

pub use cookies::SessionCookies;
pub use gate::{AccessGate, AuthUser, ProfileStore, SessionProvider};
pub use middleware::{require_access, signed_out_redirect};

pub const SIGN_IN_PATH: &str = "/auth/sign-in";
pub const SIGN_UP_PATH: &str = "/auth/sign-up";

pub const MSG_AUTH_ERROR: &str = "Authentication error";
pub const MSG_ACCOUNT_INACTIVE: &str = "Account is inactive";
pub const MSG_INVALID_ROLE: &str = "Invalid user role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Worker,
    Client,
}

impl Role {
    /// Parses the raw `users.role` column. Anything else is an invalid role.
    pub fn parse(raw: &str) -> Option<Role> {
        match raw {
            "admin" => Some(Role::Admin),
            "worker" => Some(Role::Worker),
            "client" => Some(Role::Client),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Worker => "worker",
            Role::Client => "client",
        }
    }

    /// Landing route for a signed-in user of this role.
    pub fn home_path(&self) -> &'static str {
        match self {
            Role::Admin => "/admin/dashboard",
            Role::Worker => "/worker/dashboard",
            Role::Client => "/dashboard",
        }
    }

    fn scope_prefix(&self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Worker => "/worker",
            Role::Client => "/dashboard",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a route requires from the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// No gate at all.
    Public,
    /// Sign-in / sign-up pages: open to anonymous users, signed-in users are sent home.
    AuthPage,
    Protected(Role),
}

impl RouteAccess {
    pub fn for_path(path: &str) -> Self {
        for role in [Role::Admin, Role::Worker, Role::Client] {
            if is_under(path, role.scope_prefix()) {
                return RouteAccess::Protected(role);
            }
        }
        if path == SIGN_IN_PATH || path == SIGN_UP_PATH {
            return RouteAccess::AuthPage;
        }
        RouteAccess::Public
    }

    /// Form submissions to the auth pages are actions, not navigations, and pass through.
    pub fn for_request(method: &Method, path: &str) -> Self {
        match Self::for_path(path) {
            RouteAccess::AuthPage if method != Method::GET && method != Method::HEAD => {
                RouteAccess::Public
            }
            access => access,
        }
    }
}

fn is_under(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// The identity handed to handlers once the gate allows a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Carries the resolved user for protected routes, `None` for anonymous access.
    Allow(Option<CurrentUser>),
    RedirectTo(String),
    SignOutAndRedirect { path: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("no active session")]
    SessionMissing,

    #[error("user profile lookup failed")]
    ProfileLookupFailed,

    #[error("account is inactive")]
    AccountInactive,

    #[error("role {actual} cannot access {required} routes")]
    RoleMismatch { actual: Role, required: Role },

    #[error("unrecognized role '{0}'")]
    InvalidRole(String),
}

impl AccessError {
    /// Maps the failure to the navigation it forces. `requested` is kept as
    /// `returnUrl` when the user simply has to sign in.
    pub fn outcome(&self, requested: &str) -> GateOutcome {
        match self {
            AccessError::SessionMissing => {
                GateOutcome::RedirectTo(with_query(SIGN_IN_PATH, &[("returnUrl", requested)]))
            }
            AccessError::RoleMismatch { actual, .. } => {
                GateOutcome::RedirectTo(actual.home_path().to_string())
            }
            AccessError::ProfileLookupFailed => sign_out(MSG_AUTH_ERROR),
            AccessError::AccountInactive => sign_out(MSG_ACCOUNT_INACTIVE),
            AccessError::InvalidRole(_) => sign_out(MSG_INVALID_ROLE),
        }
    }
}

fn sign_out(message: &str) -> GateOutcome {
    GateOutcome::SignOutAndRedirect {
        path: SIGN_IN_PATH.to_string(),
        message: message.to_string(),
    }
}

/// Turns the profile lookup for a signed-in user into a usable identity.
/// Inactive accounts are rejected before the role is looked at.
pub fn resolve_identity(
    user: &AuthUser,
    profile: anyhow::Result<Option<AccessProfile>>,
) -> Result<CurrentUser, AccessError> {
    let profile = match profile {
        Ok(Some(profile)) => profile,
        Ok(None) | Err(_) => return Err(AccessError::ProfileLookupFailed),
    };
    if !profile.is_active {
        return Err(AccessError::AccountInactive);
    }
    let role = Role::parse(&profile.role).ok_or(AccessError::InvalidRole(profile.role))?;
    Ok(CurrentUser {
        id: user.id,
        email: user.email.clone(),
        role,
    })
}

pub fn authorize(required: Role, user: &CurrentUser) -> Result<(), AccessError> {
    if user.role == required {
        Ok(())
    } else {
        Err(AccessError::RoleMismatch {
            actual: user.role,
            required,
        })
    }
}

/// Appends url-encoded query parameters to a local path.
pub fn with_query(path: &str, params: &[(&str, &str)]) -> String {
    let mut out = path.to_string();
    let mut sep = if path.contains('?') { '&' } else { '?' };
    for (key, value) in params {
        out.push(sep);
        out.push_str(&urlencoding::encode(key));
        out.push('=');
        out.push_str(&urlencoding::encode(value));
        sep = '&';
    }
    out
}

/// Accepts a post-sign-in `returnUrl` only when it is a local path inside
/// the user's own dashboard. Anything else falls back to the role's home.
/// The value ends up in a `Location` header, so only visible ASCII is accepted.
pub fn safe_return_url(raw: &str, role: Role) -> Option<&str> {
    if !raw.starts_with('/') || raw.starts_with("//") || raw.contains('\\') {
        return None;
    }
    if !raw.bytes().all(|b| b.is_ascii_graphic()) {
        return None;
    }
    let path = raw.split(['?', '#']).next().unwrap_or(raw);
    match RouteAccess::for_path(path) {
        RouteAccess::Protected(required) if required == role => Some(raw),
        _ => None,
    }
}
