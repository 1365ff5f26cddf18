use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{admin, files, public};
use crate::middleware::session_guard::session_guard;
use crate::state::AppState;

/// Assemble the full router. State is injected once here and threaded
/// to every handler.
pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Unauthenticated provisioning API
        .route("/admin/api/users", post(public::provision_user))
        // Stored file serving
        .route("/files/:bucket/*path", get(files::serve))
        // Admin space behind the session guard
        .merge(admin_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn admin_routes() -> Router<AppState> {
    use axum::middleware;

    Router::new()
        .route("/admin/login", get(public::login_screen).post(public::login))
        .route("/admin/logout", post(public::logout))
        .route("/admin/dashboard", get(admin::dashboard::stats))
        // Policies create is multipart (optional file upload), so the
        // static route shadows the generic one
        .route("/admin/policies", get(admin::policies::list).post(admin::policies::create))
        .route(
            "/admin/meetings/:id/attendance",
            get(admin::attendance::roster).post(admin::attendance::record),
        )
        // Generic entity operations (collection and record level)
        .route("/admin/:entity", get(admin::data::list).post(admin::data::create))
        .route(
            "/admin/:entity/:id",
            get(admin::data::get_one)
                .put(admin::data::update)
                .delete(admin::data::delete),
        )
        .layer(middleware::from_fn(session_guard))
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Party Admin API",
            "version": version,
            "description": "Back-office admin API for the party's public data platform",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "login": "/admin/login (public - session acquisition)",
                "provisioning": "/admin/api/users (public - account provisioning)",
                "entities": "/admin/:entity[/:record] (protected)",
                "attendance": "/admin/meetings/:id/attendance (protected)",
                "dashboard": "/admin/dashboard (protected)",
                "files": "/files/:bucket/*path (public)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health().await {
        Ok(()) => (
            axum::http::StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
