use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Form, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::config;
use crate::database::store::{ListQuery, SortDirection};
use crate::entity::pipeline::{run_mutation, MutationOp};
use crate::entity::schema::{schema_for, FieldSet};
use crate::entity::EntityKind;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Search term matched against the entity's search column
    pub q: Option<String>,
}

fn parse_kind(segment: &str) -> Result<EntityKind, ApiError> {
    EntityKind::from_path(segment)
        .ok_or_else(|| ApiError::not_found(format!("Unknown entity type: {}", segment)))
}

/// Shared list implementation: newest first, range pagination, exact
/// total count. Reads go straight to the store on every request.
pub async fn list_kind(
    state: &AppState,
    kind: EntityKind,
    params: &ListParams,
) -> Result<Json<Value>, ApiError> {
    let api = &config::config().api;
    let page = params.page.unwrap_or(1).max(1);
    let per_page = params
        .per_page
        .unwrap_or(api.default_page_size)
        .clamp(1, api.max_page_size);

    // page comes straight off the query string; keep the offset
    // arithmetic total
    let offset = page.saturating_sub(1).saturating_mul(per_page);
    let mut query = ListQuery::default()
        .order("created_at", SortDirection::Desc)
        .range(per_page, offset);
    if let Some(term) = params.q.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        query = query.search(schema_for(kind).search_column, term);
    }

    let items = state.store.select(kind.table(), &query).await?;
    let total = state.store.count(kind.table(), &query).await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "items": items,
            "total": total,
            "page": page,
            "per_page": per_page,
        }
    })))
}

/// GET /admin/:entity - paginated list view data
pub async fn list(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_kind(&entity)?;
    list_kind(&state, kind, &params).await
}

/// GET /admin/:entity/:id - single record for the edit screen
pub async fn get_one(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, Uuid)>,
) -> Result<Json<Value>, ApiError> {
    let kind = parse_kind(&entity)?;
    let record = state
        .store
        .select_by_id(kind.table(), id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("{} {} not found", kind.label(), id)))?;

    Ok(Json(json!({ "success": true, "data": record })))
}

/// POST /admin/:entity - create via the mutation pipeline
pub async fn create(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Redirect, ApiError> {
    let kind = parse_kind(&entity)?;
    create_kind(&state, kind, fields).await
}

pub async fn create_kind(
    state: &AppState,
    kind: EntityKind,
    fields: FieldSet,
) -> Result<Redirect, ApiError> {
    let outcome = run_mutation(
        state.store.as_ref(),
        state.revalidator.as_ref(),
        kind,
        MutationOp::Create,
        &fields,
        None,
    )
    .await?;
    Ok(Redirect::to(&outcome.redirect))
}

/// PUT /admin/:entity/:id - full-record overwrite of the submitted fields
pub async fn update(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, Uuid)>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Redirect, ApiError> {
    let kind = parse_kind(&entity)?;
    let outcome = run_mutation(
        state.store.as_ref(),
        state.revalidator.as_ref(),
        kind,
        MutationOp::Update,
        &fields,
        Some(id),
    )
    .await?;
    Ok(Redirect::to(&outcome.redirect))
}

/// DELETE /admin/:entity/:id
pub async fn delete(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, Uuid)>,
) -> Result<Redirect, ApiError> {
    let kind = parse_kind(&entity)?;
    let outcome = run_mutation(
        state.store.as_ref(),
        state.revalidator.as_ref(),
        kind,
        MutationOp::Delete,
        &FieldSet::new(),
        Some(id),
    )
    .await?;
    Ok(Redirect::to(&outcome.redirect))
}
