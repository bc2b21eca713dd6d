use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::access::{
    safe_return_url, signed_out_redirect, with_query, AccessGate, GateOutcome, SIGN_IN_PATH,
    SIGN_UP_PATH,
};
use crate::errors::AppError;
use crate::state::AppState;
use crate::supabase::{AccountProvider, SignUpRequest, SupabaseError};
use crate::validation::validate_credentials;

const MSG_BAD_CREDENTIALS: &str = "Invalid email or password";
const MSG_CONFIRM_EMAIL: &str = "Check your email to confirm your account";
const MSG_SIGNED_OUT: &str = "You have been signed out";

#[derive(Debug, Deserialize)]
pub struct AuthPageQuery {
    pub message: Option<String>,
    #[serde(rename = "returnUrl")]
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthPage {
    pub page: &'static str,
    pub message: Option<String>,
    #[serde(rename = "returnUrl")]
    pub return_url: Option<String>,
}

#[derive(Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
    #[serde(rename = "returnUrl", default)]
    pub return_url: Option<String>,
}

#[derive(Deserialize)]
pub struct SignUpForm {
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// GET /auth/sign-in
pub async fn sign_in_page(Query(q): Query<AuthPageQuery>) -> Json<AuthPage> {
    Json(AuthPage {
        page: "sign-in",
        message: q.message,
        return_url: q.return_url,
    })
}

/// GET /auth/sign-up
pub async fn sign_up_page(Query(q): Query<AuthPageQuery>) -> Json<AuthPage> {
    Json(AuthPage {
        page: "sign-up",
        message: q.message,
        return_url: None,
    })
}

fn back_to_sign_in(message: &str, return_url: Option<&str>) -> Response {
    let mut params = vec![("message", message)];
    if let Some(r) = return_url {
        params.push(("returnUrl", r));
    }
    Redirect::to(&with_query(SIGN_IN_PATH, &params)).into_response()
}

/// POST /auth/sign-in
pub async fn sign_in(
    State(state): State<AppState>,
    Form(form): Form<SignInForm>,
) -> Result<Response, AppError> {
    sign_in_with(state.auth.as_ref(), &state.gate, form).await
}

/// Password sign-in followed by the same account checks the gate applies on
/// every navigation, so a refused account never receives session cookies.
async fn sign_in_with(
    auth: &dyn AccountProvider,
    gate: &AccessGate,
    form: SignInForm,
) -> Result<Response, AppError> {
    let email = form.email.trim().to_lowercase();
    let return_url = form.return_url.as_deref().filter(|r| !r.is_empty());
    if let Err(AppError::Validation(msg)) = validate_credentials(&email, &form.password) {
        return Ok(back_to_sign_in(&msg, return_url));
    }

    let session = match auth.sign_in_with_password(&email, &form.password).await {
        Ok(session) => session,
        Err(SupabaseError::InvalidCredentials) => {
            info!("Failed sign-in attempt");
            gate.record_failed_login(&email).await;
            return Ok(back_to_sign_in(MSG_BAD_CREDENTIALS, return_url));
        }
        Err(e) => return Err(e.into()),
    };

    let user = match gate.resolve(&session.user).await {
        Ok(user) => user,
        Err(e) => {
            warn!("Sign-in of user {} refused: {e}", session.user.id);
            gate.sign_out(&session.access_token).await;
            return Ok(match e.outcome(SIGN_IN_PATH) {
                GateOutcome::SignOutAndRedirect { path, message } => {
                    signed_out_redirect(gate.cookies(), &path, &message)
                }
                GateOutcome::RedirectTo(location) => Redirect::to(&location).into_response(),
                GateOutcome::Allow(_) => back_to_sign_in(MSG_BAD_CREDENTIALS, None),
            });
        }
    };

    let target = return_url
        .and_then(|r| safe_return_url(r, user.role))
        .unwrap_or(user.role.home_path());
    info!("User {} signed in as {}", user.id, user.role);

    let mut response = Redirect::to(target).into_response();
    for value in gate.cookies().issue(
        &session.access_token,
        &session.refresh_token,
        session.expires_in,
    ) {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    Ok(response)
}

/// POST /auth/sign-up
pub async fn sign_up(
    State(state): State<AppState>,
    Form(form): Form<SignUpForm>,
) -> Result<Response, AppError> {
    let email = form.email.trim().to_lowercase();
    let full_name = form.full_name.trim().to_string();
    let invalid = match validate_credentials(&email, &form.password) {
        Err(AppError::Validation(msg)) => Some(msg),
        _ if full_name.is_empty() => Some("full name is required".to_string()),
        _ => None,
    };
    if let Some(msg) = invalid {
        return Ok(
            Redirect::to(&with_query(SIGN_UP_PATH, &[("message", msg.as_str())])).into_response(),
        );
    }

    let request = SignUpRequest {
        email,
        password: form.password,
        full_name,
        phone: form.phone.filter(|p| !p.trim().is_empty()),
    };
    match state.auth.sign_up(&request).await {
        Ok(()) => Ok(back_to_sign_in(MSG_CONFIRM_EMAIL, None)),
        Err(SupabaseError::Api { status, message }) if status < 500 => Ok(Redirect::to(
            &with_query(SIGN_UP_PATH, &[("message", message.as_str())]),
        )
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// POST /auth/sign-out
pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = state.gate.cookies().token_from_headers(&headers) {
        state.gate.sign_out(&token).await;
    }
    signed_out_redirect(state.gate.cookies(), SIGN_IN_PATH, MSG_SIGNED_OUT)
}
