use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /files/:bucket/*path - stream a stored object back with its
/// recorded content type
pub async fn serve(
    State(state): State<AppState>,
    Path((bucket, path)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let path = path.trim_start_matches('/');
    let object = state
        .files
        .get(&bucket, path)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No such file: {}/{}", bucket, path)))?;

    Ok(([(header::CONTENT_TYPE, object.content_type)], object.content).into_response())
}
