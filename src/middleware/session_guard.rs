use axum::{
    extract::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use uuid::Uuid;

use crate::auth::{self, SESSION_COOKIE};
use crate::config;

pub const LOGIN_PATH: &str = "/admin/login";
pub const DASHBOARD_PATH: &str = "/admin/dashboard";
const PROTECTED_PREFIX: &str = "/admin";
/// Unauthenticated API routes live under this prefix (user provisioning)
const PUBLIC_API_PREFIX: &str = "/admin/api/";

/// Authenticated staff identity attached to the request after the
/// guard passes it through
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardAction {
    Pass,
    RedirectToLogin,
    RedirectToDashboard,
}

/// The routing decision, separated from cookie mechanics:
/// unauthenticated requests inside the protected space go to the login
/// path, authenticated requests to the login path go to the dashboard.
pub fn decide(path: &str, authenticated: bool) -> GuardAction {
    if path == LOGIN_PATH {
        return if authenticated {
            GuardAction::RedirectToDashboard
        } else {
            GuardAction::Pass
        };
    }
    if path.starts_with(PUBLIC_API_PREFIX) {
        return GuardAction::Pass;
    }
    if path.starts_with(PROTECTED_PREFIX) && !authenticated {
        return GuardAction::RedirectToLogin;
    }
    GuardAction::Pass
}

/// Build the session cookie with its standard attributes
pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config::config().security.cookie_secure)
        .build()
}

/// Cookie used to clear a stale or surrendered session
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Session Guard middleware: refresh the session on every request,
/// then gate access to the /admin route space.
///
/// Any error while refreshing (expired token, bad signature, malformed
/// cookie) counts as no identity - the guard fails closed and
/// redirects to the login path rather than letting the request pass.
pub async fn session_guard(jar: CookieJar, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();

    // Sliding expiry: a valid token is re-signed and rewritten on the
    // outgoing response
    let identity = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| auth::refresh_token(cookie.value()).ok());

    match decide(&path, identity.is_some()) {
        GuardAction::RedirectToLogin => {
            let jar = jar.remove(removal_cookie());
            (jar, Redirect::to(LOGIN_PATH)).into_response()
        }
        GuardAction::RedirectToDashboard => {
            let jar = match identity {
                Some((_, renewed)) => jar.add(session_cookie(renewed)),
                None => jar,
            };
            (jar, Redirect::to(DASHBOARD_PATH)).into_response()
        }
        GuardAction::Pass => match identity {
            Some((claims, renewed)) => {
                request.extensions_mut().insert(AuthUser {
                    id: claims.sub,
                    email: claims.email.clone(),
                });
                let jar = jar.add(session_cookie(renewed));
                (jar, next.run(request).await).into_response()
            }
            None => next.run(request).await,
        },
    }
}
