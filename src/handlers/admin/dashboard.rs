use axum::{extract::State, Extension, Json};
use serde_json::{json, Map, Value};

use crate::database::store::ListQuery;
use crate::entity::EntityKind;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::state::AppState;

/// GET /admin/dashboard - record counts backing the stat cards, plus
/// the signed-in identity for the header
pub async fn stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let mut counts = Map::new();
    for kind in EntityKind::ALL {
        let count = state.store.count(kind.table(), &ListQuery::default()).await?;
        counts.insert(kind.table().to_string(), json!(count));
    }

    Ok(Json(json!({
        "success": true,
        "data": {
            "counts": counts,
            "user": { "id": user.id, "email": user.email },
        }
    })))
}
