use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::{with_query, AccessGate, GateOutcome, RouteAccess, SessionCookies};

/// Axum middleware running the [`AccessGate`] in front of every route.
///
/// Allowed requests get the resolved [`super::CurrentUser`] as a request
/// extension. Redirects are `303 See Other`; sign-out outcomes also end the
/// provider session and expire the session cookies.
pub async fn require_access(
    State(gate): State<AccessGate>,
    mut req: Request,
    next: Next,
) -> Response {
    let access = RouteAccess::for_request(req.method(), req.uri().path());
    if access == RouteAccess::Public {
        return next.run(req).await;
    }

    let requested = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let token = gate.cookies().token_from_headers(req.headers());

    match gate.evaluate(access, &requested, token.as_deref()).await {
        GateOutcome::Allow(user) => {
            if let Some(user) = user {
                req.extensions_mut().insert(user);
            }
            next.run(req).await
        }
        GateOutcome::RedirectTo(location) => Redirect::to(&location).into_response(),
        GateOutcome::SignOutAndRedirect { path, message } => {
            if let Some(token) = token.as_deref() {
                gate.sign_out(token).await;
            }
            signed_out_redirect(gate.cookies(), &path, &message)
        }
    }
}

/// Redirect carrying a user-facing `message`, expiring the session cookies on the way.
pub fn signed_out_redirect(cookies: &SessionCookies, path: &str, message: &str) -> Response {
    let mut response = Redirect::to(&with_query(path, &[("message", message)])).into_response();
    for value in cookies.clear() {
        response.headers_mut().append(header::SET_COOKIE, value);
    }
    response
}
