use serde_json::Value;
use thiserror::Error;

use crate::database::store::{Datastore, ListQuery, Row, SortDirection, StoreError};
use crate::entity::schema::FieldSet;
use crate::entity::EntityKind;
use crate::revalidate::Revalidator;

pub const ATTENDANCE_TABLE: &str = "attendance";
const STATUS_PREFIX: &str = "status-";

/// Attendance status as the party has always recorded it - the Thai
/// wire strings are the stored representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceStatus {
    Present,
    Excused,
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "เข้าประชุม",
            AttendanceStatus::Excused => "ลา",
            AttendanceStatus::Absent => "ขาด",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "เข้าประชุม" => Some(AttendanceStatus::Present),
            "ลา" => Some(AttendanceStatus::Excused),
            "ขาด" => Some(AttendanceStatus::Absent),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("No attendance entries were submitted")]
    Empty,

    #[error("Invalid status '{value}' for personnel {personnel_id}")]
    InvalidStatus { personnel_id: String, value: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Pull `status-<personnelId>` pairs out of a submitted field set.
/// Keys without the prefix are ignored; an unknown status value fails
/// the whole submission.
pub fn parse_status_fields(
    fields: &FieldSet,
) -> Result<Vec<(String, AttendanceStatus)>, AttendanceError> {
    let mut entries = Vec::new();
    for (key, value) in fields {
        let personnel_id = match key.strip_prefix(STATUS_PREFIX) {
            Some(id) if !id.is_empty() => id,
            _ => continue,
        };
        let status = AttendanceStatus::parse(value).ok_or_else(|| AttendanceError::InvalidStatus {
            personnel_id: personnel_id.to_string(),
            value: value.clone(),
        })?;
        entries.push((personnel_id.to_string(), status));
    }
    // Stable order keeps the batch deterministic
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

/// Record attendance for one meeting: one batch upsert keyed by
/// (meeting_id, personnel_id), existing pairs overwritten. An empty
/// submission fails before any write.
pub async fn record_attendance(
    store: &dyn Datastore,
    revalidator: &dyn Revalidator,
    meeting_id: &str,
    fields: &FieldSet,
) -> Result<usize, AttendanceError> {
    let entries = parse_status_fields(fields)?;
    if entries.is_empty() {
        return Err(AttendanceError::Empty);
    }

    let rows: Vec<Row> = entries
        .iter()
        .map(|(personnel_id, status)| {
            let mut row = Row::new();
            row.insert("meeting_id".to_string(), Value::String(meeting_id.to_string()));
            row.insert("personnel_id".to_string(), Value::String(personnel_id.clone()));
            row.insert("status".to_string(), Value::String(status.as_str().to_string()));
            row
        })
        .collect();

    store
        .upsert(ATTENDANCE_TABLE, &["meeting_id", "personnel_id"], &rows)
        .await?;
    tracing::info!(meeting_id, entries = rows.len(), "attendance recorded");

    revalidator.revalidate_path(&EntityKind::Meeting.list_path());
    Ok(rows.len())
}

/// Personnel eligible to appear on a meeting's attendance sheet:
/// all active personnel for a "general" meeting, only the meeting
/// campus's active personnel otherwise.
pub async fn eligible_personnel(
    store: &dyn Datastore,
    meeting: &Row,
) -> Result<Vec<Row>, StoreError> {
    let scope = meeting.get("scope").and_then(|v| v.as_str()).unwrap_or("general");

    let mut query = ListQuery::default()
        .eq("is_active", true)
        .order("name", SortDirection::Asc);
    if scope != "general" {
        query = query.eq("campus", scope);
    }

    store.select(EntityKind::Personnel.table(), &query).await
}

/// Current attendance rows for a meeting
pub async fn attendance_for_meeting(
    store: &dyn Datastore,
    meeting_id: &str,
) -> Result<Vec<Row>, StoreError> {
    let query = ListQuery::default().eq("meeting_id", meeting_id);
    store.select(ATTENDANCE_TABLE, &query).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{field_set, test_env};

    #[test]
    fn status_round_trips_thai_wire_strings() {
        for status in [AttendanceStatus::Present, AttendanceStatus::Excused, AttendanceStatus::Absent] {
            assert_eq!(AttendanceStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AttendanceStatus::parse("present"), None);
    }

    #[test]
    fn parse_ignores_unprefixed_keys_and_rejects_bad_status() {
        let entries =
            parse_status_fields(&field_set(&[("status-p1", "เข้าประชุม"), ("topic", "x")])).unwrap();
        assert_eq!(entries, vec![("p1".to_string(), AttendanceStatus::Present)]);

        let err = parse_status_fields(&field_set(&[("status-p1", "maybe")])).unwrap_err();
        assert!(matches!(err, AttendanceError::InvalidStatus { .. }));
    }

    #[tokio::test]
    async fn empty_submission_fails_without_writing() {
        let env = test_env();
        let err = record_attendance(env.store.as_ref(), env.revalidator.as_ref(), "m1", &field_set(&[("noise", "x")]))
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::Empty));
        assert_eq!(env.memory.table_len(ATTENDANCE_TABLE), 0);
    }

    #[tokio::test]
    async fn upsert_is_idempotent_per_pair_with_last_write_winning() {
        let env = test_env();

        record_attendance(
            env.store.as_ref(),
            env.revalidator.as_ref(),
            "m1",
            &field_set(&[("status-p1", "เข้าประชุม"), ("status-p2", "ขาด")]),
        )
        .await
        .unwrap();

        record_attendance(env.store.as_ref(), env.revalidator.as_ref(), "m1", &field_set(&[("status-p1", "ลา")]))
            .await
            .unwrap();

        let rows = attendance_for_meeting(env.store.as_ref(), "m1").await.unwrap();
        assert_eq!(rows.len(), 2);
        let status_of = |pid: &str| {
            rows.iter()
                .find(|r| r.get("personnel_id").and_then(|v| v.as_str()) == Some(pid))
                .and_then(|r| r.get("status"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        assert_eq!(status_of("p1").as_deref(), Some("ลา"));
        assert_eq!(status_of("p2").as_deref(), Some("ขาด"));
    }

    #[tokio::test]
    async fn eligibility_follows_meeting_scope() {
        let env = test_env();
        env.memory.seed(
            "personnel",
            &[
                &[("name", "A"), ("campus", "rangsit"), ("is_active", "true")],
                &[("name", "B"), ("campus", "lampang"), ("is_active", "true")],
                &[("name", "C"), ("campus", "rangsit"), ("is_active", "false")],
            ],
        );

        let mut general = Row::new();
        general.insert("scope".to_string(), Value::String("general".to_string()));
        let everyone = eligible_personnel(env.store.as_ref(), &general).await.unwrap();
        assert_eq!(everyone.len(), 2);

        let mut scoped = Row::new();
        scoped.insert("scope".to_string(), Value::String("rangsit".to_string()));
        let campus_only = eligible_personnel(env.store.as_ref(), &scoped).await.unwrap();
        assert_eq!(campus_only.len(), 1);
        assert_eq!(campus_only[0].get("name").and_then(|v| v.as_str()), Some("A"));
    }
}
