use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;

use crate::auth;
use crate::error::ApiError;
use crate::middleware::session_guard::{removal_cookie, session_cookie, DASHBOARD_PATH, LOGIN_PATH};
use crate::services::IdentityError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ProvisionRequest {
    pub email: String,
    pub password: String,
}

/// GET /admin/login - describes the login form for the rendering layer
pub async fn login_screen() -> Json<serde_json::Value> {
    Json(json!({
        "success": true,
        "data": {
            "form": "login",
            "action": LOGIN_PATH,
            "fields": ["email", "password"],
        }
    }))
}

/// POST /admin/login - check credentials, set the session cookie and
/// land on the dashboard
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state
        .identity
        .authenticate(&form.email, &form.password)
        .await
        .map_err(|err| match err {
            IdentityError::BadCredentials => ApiError::unauthorized("Invalid email or password"),
            IdentityError::Store(store_err) => store_err.into(),
            other => ApiError::bad_request(other.to_string()),
        })?;

    let token = auth::issue_token(user.id, &user.email)?;
    tracing::info!(email = %user.email, "staff login");
    Ok((jar.add(session_cookie(token)), Redirect::to(DASHBOARD_PATH)))
}

/// POST /admin/logout - clear the session cookie
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    (jar.remove(removal_cookie()), Redirect::to(LOGIN_PATH))
}

/// POST /admin/api/users - provision a staff account.
///
/// Response shape follows the administrative identity-service
/// contract: `{message, user}` on success, `{error}` on failure.
pub async fn provision_user(
    State(state): State<AppState>,
    Json(req): Json<ProvisionRequest>,
) -> Response {
    match state.identity.provision(&req.email, &req.password).await {
        Ok(user) => (
            StatusCode::OK,
            Json(json!({ "message": "User created successfully", "user": user })),
        )
            .into_response(),
        Err(err @ (IdentityError::Invalid(_) | IdentityError::Duplicate)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": err.to_string() })),
        )
            .into_response(),
        Err(err) => {
            tracing::error!("user provisioning failed: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to create user" })),
            )
                .into_response()
        }
    }
}
