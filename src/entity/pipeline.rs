use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use crate::database::store::{Datastore, StoreError};
use crate::entity::schema::{schema_for, FieldSet};
use crate::entity::EntityKind;
use crate::revalidate::Revalidator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOp {
    Create,
    Update,
    Delete,
}

/// Why a mutation did not happen. Exactly one write attempt is made;
/// none of these are retried.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("Validation failed")]
    Validation(HashMap<String, String>),

    #[error("Missing record identifier for {0:?}")]
    MissingIdentifier(MutationOp),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Successful outcome: what happened, and where the caller goes next.
#[derive(Debug, Clone)]
pub struct MutationSuccess {
    pub id: Option<Uuid>,
    pub message: String,
    pub redirect: String,
}

/// The single mutation path shared by every entity type: look up the
/// schema, coerce, validate, persist, revalidate the list view.
pub async fn run_mutation(
    store: &dyn Datastore,
    revalidator: &dyn Revalidator,
    kind: EntityKind,
    op: MutationOp,
    fields: &FieldSet,
    target: Option<Uuid>,
) -> Result<MutationSuccess, MutationError> {
    let schema = schema_for(kind);
    let list_path = kind.list_path();

    let success = match op {
        MutationOp::Create => {
            let mut row = schema.coerce(fields, true);
            schema.validate(&row).map_err(MutationError::Validation)?;
            // The server owns identifier generation
            row.remove("id");
            let id = store.insert(kind.table(), &row).await?;
            tracing::info!(entity = kind.table(), %id, "record created");
            MutationSuccess {
                id: Some(id),
                message: format!("The {} was created", kind.label()),
                redirect: kind.follow_up_path(id).unwrap_or_else(|| list_path.clone()),
            }
        }
        MutationOp::Update => {
            let id = target.ok_or(MutationError::MissingIdentifier(op))?;
            // Submitted fields only; defaults here would clobber
            // stored values the form never carried
            let mut row = schema.coerce(fields, false);
            schema.validate(&row).map_err(MutationError::Validation)?;
            row.remove("id");
            store.update(kind.table(), id, &row).await?;
            tracing::info!(entity = kind.table(), %id, "record updated");
            MutationSuccess {
                id: Some(id),
                message: format!("The {} was updated", kind.label()),
                redirect: list_path.clone(),
            }
        }
        MutationOp::Delete => {
            let id = target.ok_or(MutationError::MissingIdentifier(op))?;
            store.delete(kind.table(), id).await?;
            tracing::info!(entity = kind.table(), %id, "record deleted");
            MutationSuccess {
                id: None,
                message: format!("The {} was deleted", kind.label()),
                redirect: list_path.clone(),
            }
        }
    };

    // Only reached after a successful write
    revalidator.revalidate_path(&list_path);
    Ok(success)
}
