use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    authorize, resolve_identity, AccessError, CurrentUser, GateOutcome, RouteAccess,
    SessionCookies,
};
use crate::models::user::AccessProfile;

/// Identity as reported by the auth provider for a valid session token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// The hosted identity provider. Session lifecycle is owned entirely by it.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// `Ok(None)` when the token is expired, revoked or otherwise rejected.
    async fn current_user(&self, access_token: &str) -> Result<Option<AuthUser>>;

    async fn sign_out(&self, access_token: &str) -> Result<()>;
}

/// Source of the `{role, is_active}` pair that drives every routing decision.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn fetch_access_profile(&self, user_id: Uuid) -> Result<Option<AccessProfile>>;

    /// Lets the store count the failure and lock the account when needed.
    async fn record_failed_login(&self, email: &str) -> Result<()>;
}

/// The single guard shared by every route. Cheap to clone.
#[derive(Clone)]
pub struct AccessGate {
    sessions: Arc<dyn SessionProvider>,
    profiles: Arc<dyn ProfileStore>,
    cookies: SessionCookies,
}

impl AccessGate {
    pub fn new(
        sessions: Arc<dyn SessionProvider>,
        profiles: Arc<dyn ProfileStore>,
        cookies: SessionCookies,
    ) -> Self {
        Self {
            sessions,
            profiles,
            cookies,
        }
    }

    pub fn cookies(&self) -> &SessionCookies {
        &self.cookies
    }

    /// Evaluates one navigation. `requested` is the path plus query, used as
    /// `returnUrl` when the caller has to sign in first.
    pub async fn evaluate(
        &self,
        access: RouteAccess,
        requested: &str,
        token: Option<&str>,
    ) -> GateOutcome {
        let required = match access {
            RouteAccess::Public => return GateOutcome::Allow(None),
            RouteAccess::AuthPage => None,
            RouteAccess::Protected(role) => Some(role),
        };

        let user = match token {
            Some(token) => self.session_user(token).await,
            None => None,
        };
        let Some(user) = user else {
            return match required {
                Some(_) => AccessError::SessionMissing.outcome(requested),
                None => GateOutcome::Allow(None),
            };
        };

        let current = match self.resolve(&user).await {
            Ok(current) => current,
            Err(e) => {
                warn!("Denying {requested} for user {}: {e}", user.id);
                return e.outcome(requested);
            }
        };

        let Some(required) = required else {
            debug!("User {} already signed in, leaving {requested}", current.id);
            return GateOutcome::RedirectTo(current.role.home_path().to_string());
        };
        match authorize(required, &current) {
            Ok(()) => GateOutcome::Allow(Some(current)),
            Err(e) => {
                debug!("Redirecting user {}: {e}", current.id);
                e.outcome(requested)
            }
        }
    }

    /// Looks up `{role, is_active}` for an authenticated user. Used by the gate
    /// and right after a password sign-in.
    pub async fn resolve(&self, user: &AuthUser) -> Result<CurrentUser, AccessError> {
        let profile = self.profiles.fetch_access_profile(user.id).await;
        if let Err(e) = &profile {
            warn!("Profile lookup for user {} failed: {e:#}", user.id);
        }
        resolve_identity(user, profile)
    }

    /// Best-effort provider sign-out; the session cookies are cleared by the caller regardless.
    pub async fn sign_out(&self, token: &str) {
        if let Err(e) = self.sessions.sign_out(token).await {
            warn!("Provider sign-out failed: {e:#}");
        }
    }

    /// Best-effort; a failed bookkeeping call never changes the sign-in answer.
    pub async fn record_failed_login(&self, email: &str) {
        if let Err(e) = self.profiles.record_failed_login(email).await {
            warn!("Recording failed login failed: {e:#}");
        }
    }

    async fn session_user(&self, token: &str) -> Option<AuthUser> {
        match self.sessions.current_user(token).await {
            Ok(user) => user,
            Err(e) => {
                warn!("Session lookup failed, treating request as anonymous: {e:#}");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// In-memory provider: token -> user.
    #[derive(Default)]
    pub struct FakeSessions {
        pub users: HashMap<String, AuthUser>,
        pub fail: bool,
        pub sign_outs: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SessionProvider for FakeSessions {
        async fn current_user(&self, access_token: &str) -> Result<Option<AuthUser>> {
            if self.fail {
                anyhow::bail!("provider unreachable");
            }
            Ok(self.users.get(access_token).cloned())
        }

        async fn sign_out(&self, access_token: &str) -> Result<()> {
            self.sign_outs
                .lock()
                .unwrap()
                .push(access_token.to_string());
            Ok(())
        }
    }

    #[derive(Default)]
    pub struct FakeProfiles {
        pub profiles: HashMap<Uuid, AccessProfile>,
        pub fail: bool,
        pub lookups: AtomicUsize,
        pub failed_logins: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProfileStore for FakeProfiles {
        async fn fetch_access_profile(&self, user_id: Uuid) -> Result<Option<AccessProfile>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("database timeout");
            }
            Ok(self.profiles.get(&user_id).cloned())
        }

        async fn record_failed_login(&self, email: &str) -> Result<()> {
            self.failed_logins.lock().unwrap().push(email.to_string());
            Ok(())
        }
    }

    pub const TOKEN: &str = "token-1";

    /// A gate with one signed-in user holding `role` / `is_active`.
    pub fn gate_with(role: &str, is_active: bool) -> (AccessGate, Arc<FakeSessions>, Uuid) {
        let (gate, sessions, _, id) = gate_and_profiles(role, is_active);
        (gate, sessions, id)
    }

    /// Same as [`gate_with`], also handing back the profile store.
    pub fn gate_and_profiles(
        role: &str,
        is_active: bool,
    ) -> (AccessGate, Arc<FakeSessions>, Arc<FakeProfiles>, Uuid) {
        let id = Uuid::new_v4();
        let mut sessions = FakeSessions::default();
        sessions.users.insert(
            TOKEN.to_string(),
            AuthUser {
                id,
                email: Some("staff@salon.test".to_string()),
            },
        );
        let sessions = Arc::new(sessions);
        let mut profiles = FakeProfiles::default();
        profiles.profiles.insert(
            id,
            AccessProfile {
                role: role.to_string(),
                is_active,
            },
        );
        let profiles = Arc::new(profiles);
        let gate = AccessGate::new(
            sessions.clone(),
            profiles.clone(),
            SessionCookies::default(),
        );
        (gate, sessions, profiles, id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::fakes::*;
    use super::*;
    use crate::access::{Role, MSG_ACCOUNT_INACTIVE, MSG_AUTH_ERROR, MSG_INVALID_ROLE, SIGN_IN_PATH};

    fn signed_out(message: &str) -> GateOutcome {
        GateOutcome::SignOutAndRedirect {
            path: SIGN_IN_PATH.to_string(),
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn test_unauthenticated_protected_routes_go_to_sign_in() {
        let (gate, _, _) = gate_with("admin", true);
        for role in [Role::Admin, Role::Worker, Role::Client] {
            let outcome = gate
                .evaluate(RouteAccess::Protected(role), role.home_path(), None)
                .await;
            match outcome {
                GateOutcome::RedirectTo(location) => {
                    assert!(location.starts_with("/auth/sign-in?returnUrl="))
                }
                other => panic!("unexpected outcome {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_unknown_token_counts_as_no_session() {
        let (gate, _, _) = gate_with("admin", true);
        let outcome = gate
            .evaluate(RouteAccess::Protected(Role::Admin), "/admin", Some("stale"))
            .await;
        assert_eq!(
            outcome,
            GateOutcome::RedirectTo("/auth/sign-in?returnUrl=%2Fadmin".to_string())
        );
    }

    #[tokio::test]
    async fn test_provider_failure_redirects_without_sign_out() {
        let sessions = Arc::new(FakeSessions {
            fail: true,
            ..Default::default()
        });
        let gate = AccessGate::new(
            sessions,
            Arc::new(FakeProfiles::default()),
            SessionCookies::default(),
        );
        let outcome = gate
            .evaluate(RouteAccess::Protected(Role::Worker), "/worker", Some(TOKEN))
            .await;
        assert!(matches!(outcome, GateOutcome::RedirectTo(_)));
    }

    #[tokio::test]
    async fn test_inactive_account_signed_out_for_every_role() {
        for role in ["admin", "worker", "client", "bogus"] {
            let (gate, _, _) = gate_with(role, false);
            let outcome = gate
                .evaluate(RouteAccess::Protected(Role::Admin), "/admin", Some(TOKEN))
                .await;
            assert_eq!(outcome, signed_out(MSG_ACCOUNT_INACTIVE), "role {role}");
        }
    }

    #[tokio::test]
    async fn test_cross_role_navigation_goes_home() {
        let cases = [
            ("admin", Role::Worker, "/admin/dashboard"),
            ("admin", Role::Client, "/admin/dashboard"),
            ("worker", Role::Admin, "/worker/dashboard"),
            ("worker", Role::Client, "/worker/dashboard"),
            ("client", Role::Admin, "/dashboard"),
            ("client", Role::Worker, "/dashboard"),
        ];
        for (role, target, home) in cases {
            let (gate, _, _) = gate_with(role, true);
            let outcome = gate
                .evaluate(RouteAccess::Protected(target), target.home_path(), Some(TOKEN))
                .await;
            assert_eq!(outcome, GateOutcome::RedirectTo(home.to_string()));
        }
    }

    #[tokio::test]
    async fn test_client_on_admin_dashboard() {
        let (gate, _, _) = gate_with("client", true);
        let outcome = gate
            .evaluate(
                RouteAccess::for_path("/admin/dashboard"),
                "/admin/dashboard",
                Some(TOKEN),
            )
            .await;
        assert_eq!(outcome, GateOutcome::RedirectTo("/dashboard".to_string()));
    }

    #[tokio::test]
    async fn test_invalid_role_signed_out() {
        let (gate, _, _) = gate_with("receptionist", true);
        let outcome = gate
            .evaluate(RouteAccess::Protected(Role::Client), "/dashboard", Some(TOKEN))
            .await;
        assert_eq!(outcome, signed_out(MSG_INVALID_ROLE));
    }

    #[tokio::test]
    async fn test_profile_lookup_error_is_fatal() {
        let mut sessions = FakeSessions::default();
        let id = Uuid::new_v4();
        sessions
            .users
            .insert(TOKEN.to_string(), AuthUser { id, email: None });
        let profiles = Arc::new(FakeProfiles {
            fail: true,
            ..Default::default()
        });
        let gate = AccessGate::new(
            Arc::new(sessions),
            profiles.clone(),
            SessionCookies::default(),
        );
        let outcome = gate
            .evaluate(RouteAccess::Protected(Role::Admin), "/admin", Some(TOKEN))
            .await;
        assert_eq!(outcome, signed_out(MSG_AUTH_ERROR));
        assert_eq!(profiles.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_user_row_is_fatal() {
        let mut sessions = FakeSessions::default();
        sessions.users.insert(
            TOKEN.to_string(),
            AuthUser {
                id: Uuid::new_v4(),
                email: None,
            },
        );
        let gate = AccessGate::new(
            Arc::new(sessions),
            Arc::new(FakeProfiles::default()),
            SessionCookies::default(),
        );
        let outcome = gate
            .evaluate(RouteAccess::Protected(Role::Client), "/dashboard", Some(TOKEN))
            .await;
        assert_eq!(outcome, signed_out(MSG_AUTH_ERROR));
    }

    #[tokio::test]
    async fn test_matching_role_is_allowed() {
        let (gate, _, id) = gate_with("worker", true);
        let outcome = gate
            .evaluate(
                RouteAccess::Protected(Role::Worker),
                "/worker/appointments",
                Some(TOKEN),
            )
            .await;
        match outcome {
            GateOutcome::Allow(Some(user)) => {
                assert_eq!(user.id, id);
                assert_eq!(user.role, Role::Worker);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_auth_page_redirects_signed_in_user_home() {
        let (gate, _, _) = gate_with("admin", true);
        let outcome = gate
            .evaluate(RouteAccess::AuthPage, SIGN_IN_PATH, Some(TOKEN))
            .await;
        assert_eq!(outcome, GateOutcome::RedirectTo("/admin/dashboard".to_string()));

        let outcome = gate.evaluate(RouteAccess::AuthPage, SIGN_IN_PATH, None).await;
        assert_eq!(outcome, GateOutcome::Allow(None));
    }

    #[tokio::test]
    async fn test_public_routes_skip_lookups() {
        let (gate, _, _) = gate_with("client", false);
        let outcome = gate.evaluate(RouteAccess::Public, "/health", Some(TOKEN)).await;
        assert_eq!(outcome, GateOutcome::Allow(None));
    }

    #[tokio::test]
    async fn test_evaluation_is_idempotent() {
        for (role, active) in [("client", true), ("client", false), ("nope", true)] {
            let (gate, _, _) = gate_with(role, active);
            let first = gate
                .evaluate(RouteAccess::Protected(Role::Admin), "/admin/users", Some(TOKEN))
                .await;
            let second = gate
                .evaluate(RouteAccess::Protected(Role::Admin), "/admin/users", Some(TOKEN))
                .await;
            assert_eq!(first, second);
        }
    }
}
