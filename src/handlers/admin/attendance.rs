use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    response::Redirect,
    Form, Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::entity::attendance::{attendance_for_meeting, eligible_personnel, record_attendance};
use crate::entity::EntityKind;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /admin/meetings/:id/attendance - the attendance entry sheet:
/// every eligible person joined with their currently recorded status
pub async fn roster(
    State(state): State<AppState>,
    Path(meeting_id): Path<Uuid>,
) -> Result<Json<Value>, ApiError> {
    let meeting = state
        .store
        .select_by_id(EntityKind::Meeting.table(), meeting_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Meeting {} not found", meeting_id)))?;

    let personnel = eligible_personnel(state.store.as_ref(), &meeting).await?;
    let recorded = attendance_for_meeting(state.store.as_ref(), &meeting_id.to_string()).await?;

    let status_by_personnel: HashMap<&str, &str> = recorded
        .iter()
        .filter_map(|row| {
            Some((
                row.get("personnel_id")?.as_str()?,
                row.get("status")?.as_str()?,
            ))
        })
        .collect();

    let roster: Vec<Value> = personnel
        .into_iter()
        .map(|person| {
            let status = person
                .get("id")
                .and_then(|v| v.as_str())
                .and_then(|id| status_by_personnel.get(id).copied());
            json!({ "personnel": person, "status": status })
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "data": { "meeting": meeting, "roster": roster }
    })))
}

/// POST /admin/meetings/:id/attendance - batch upsert of
/// status-<personnelId> entries for the meeting
pub async fn record(
    State(state): State<AppState>,
    Path(meeting_id): Path<Uuid>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Redirect, ApiError> {
    // The meeting must exist before any attendance row is written
    state
        .store
        .select_by_id(EntityKind::Meeting.table(), meeting_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Meeting {} not found", meeting_id)))?;

    record_attendance(state.store.as_ref(), state.revalidator.as_ref(), &meeting_id.to_string(), &fields).await?;
    Ok(Redirect::to(&EntityKind::Meeting.list_path()))
}
