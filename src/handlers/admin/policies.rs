use axum::{
    extract::{Multipart, Query, State},
    response::Redirect,
    Json,
};
use serde_json::Value;

use crate::entity::schema::FieldSet;
use crate::entity::EntityKind;
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage;

use super::data::{create_kind, list_kind, ListParams};

const BUCKET: &str = "policies";

/// GET /admin/policies - same list view as every other entity; the
/// static route exists because create is multipart here
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    list_kind(&state, EntityKind::Policy, &params).await
}

/// POST /admin/policies - create with an optional document upload.
///
/// The file part is stored first and its public URL injected as
/// `file_url`; an upload failure aborts the whole create before any
/// database write.
pub async fn create(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Redirect, ApiError> {
    let mut fields = FieldSet::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed form data: {}", e)))?
    {
        let name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };

        if name == "file" {
            let file_name = field.file_name().map(str::to_string);
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::bad_request(format!("Malformed form data: {}", e)))?;

            // An empty file input still submits a part; skip it
            if let Some(file_name) = file_name.filter(|_| !bytes.is_empty()) {
                let path = storage::generate_path(&file_name);
                let url = state.files.put(BUCKET, &path, &content_type, &bytes).await?;
                fields.insert("file_url".to_string(), url);
            }
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::bad_request(format!("Malformed form data: {}", e)))?;
            fields.insert(name, value);
        }
    }

    create_kind(&state, EntityKind::Policy, fields).await
}
