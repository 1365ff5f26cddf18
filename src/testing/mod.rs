use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::database::store::{Datastore, ListQuery, Row, SortDirection, StoreError};
use crate::entity::schema::FieldSet;
use crate::revalidate::Revalidator;
use crate::state::AppState;
use crate::storage::{public_url, FileStore, StorageError, StoredObject};

/// In-memory datastore for unit tests. Behaves like the Postgres store
/// for the operations the application uses: generated identifiers,
/// monotonic created_at values, conflict-keyed upserts, and the
/// eq/search/order/range list queries.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    seq: AtomicU64,
}

impl MemoryStore {
    // Monotonic timestamps so created_at ordering is deterministic
    fn next_created_at(&self) -> String {
        let n = self.seq.fetch_add(1, Ordering::SeqCst);
        format!("2026-01-01T00:00:00.{:06}Z", n)
    }

    fn insert_row(&self, table: &str, mut fields: Row) -> Uuid {
        let id = Uuid::new_v4();
        fields.insert("id".to_string(), Value::String(id.to_string()));
        fields.insert("created_at".to_string(), Value::String(self.next_created_at()));
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(fields);
        id
    }

    pub fn row(&self, table: &str, id: Uuid) -> Option<Row> {
        let want = id.to_string();
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .and_then(|rows| {
                rows.iter()
                    .find(|r| r.get("id").and_then(|v| v.as_str()) == Some(want.as_str()))
            })
            .cloned()
    }

    pub fn table_len(&self, table: &str) -> usize {
        self.tables.lock().unwrap().get(table).map_or(0, Vec::len)
    }

    /// Seed a table from literal column pairs. The strings "true" and
    /// "false" become booleans, everything else stays a string.
    pub fn seed(&self, table: &str, rows: &[&[(&str, &str)]]) {
        for columns in rows {
            let mut row = Row::new();
            for (key, value) in columns.iter() {
                let value = match *value {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    other => Value::String(other.to_string()),
                };
                row.insert((*key).to_string(), value);
            }
            self.insert_row(table, row);
        }
    }
}

fn matches(row: &Row, query: &ListQuery) -> bool {
    for (column, want) in &query.eq {
        if row.get(column) != Some(want) {
            return false;
        }
    }
    if let Some((column, term)) = &query.search {
        let hay = row.get(column).and_then(|v| v.as_str()).unwrap_or("");
        if !hay.to_lowercase().contains(&term.to_lowercase()) {
            return false;
        }
    }
    true
}

fn sort_key(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn insert(&self, table: &str, fields: &Row) -> Result<Uuid, StoreError> {
        Ok(self.insert_row(table, fields.clone()))
    }

    async fn update(&self, table: &str, id: Uuid, fields: &Row) -> Result<(), StoreError> {
        let want = id.to_string();
        let mut tables = self.tables.lock().unwrap();
        let row = tables
            .get_mut(table)
            .and_then(|rows| {
                rows.iter_mut()
                    .find(|r| r.get("id").and_then(|v| v.as_str()) == Some(want.as_str()))
            })
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", table, id)))?;

        for (key, value) in fields {
            row.insert(key.clone(), value.clone());
        }
        row.insert("updated_at".to_string(), Value::String(self.next_created_at()));
        Ok(())
    }

    async fn delete(&self, table: &str, id: Uuid) -> Result<(), StoreError> {
        let want = id.to_string();
        let mut tables = self.tables.lock().unwrap();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", table, id)))?;
        let before = rows.len();
        rows.retain(|r| r.get("id").and_then(|v| v.as_str()) != Some(want.as_str()));
        if rows.len() == before {
            return Err(StoreError::NotFound(format!("{} {}", table, id)));
        }
        Ok(())
    }

    async fn upsert(&self, table: &str, conflict_keys: &[&str], rows: &[Row]) -> Result<(), StoreError> {
        for incoming in rows {
            let existing = {
                let mut tables = self.tables.lock().unwrap();
                let stored = tables.entry(table.to_string()).or_default();
                let hit = stored.iter_mut().find(|r| {
                    conflict_keys.iter().all(|key| r.get(*key) == incoming.get(*key))
                });
                match hit {
                    Some(row) => {
                        for (key, value) in incoming {
                            row.insert(key.clone(), value.clone());
                        }
                        true
                    }
                    None => false,
                }
            };
            if !existing {
                self.insert_row(table, incoming.clone());
            }
        }
        Ok(())
    }

    async fn select(&self, table: &str, query: &ListQuery) -> Result<Vec<Row>, StoreError> {
        let mut rows: Vec<Row> = self
            .tables
            .lock()
            .unwrap()
            .get(table)
            .map(|rows| rows.iter().filter(|r| matches(r, query)).cloned().collect())
            .unwrap_or_default();

        if let Some((column, direction)) = &query.order {
            rows.sort_by_key(|r| sort_key(r.get(column)));
            if *direction == SortDirection::Desc {
                rows.reverse();
            }
        }

        let offset = query.offset.unwrap_or(0).max(0) as usize;
        let rows = rows.into_iter().skip(offset);
        Ok(match query.limit {
            Some(limit) => rows.take(limit.max(0) as usize).collect(),
            None => rows.collect(),
        })
    }

    async fn select_by_id(&self, table: &str, id: Uuid) -> Result<Option<Row>, StoreError> {
        Ok(self.row(table, id))
    }

    async fn count(&self, table: &str, query: &ListQuery) -> Result<i64, StoreError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(table)
            .map(|rows| rows.iter().filter(|r| matches(r, query)).count())
            .unwrap_or(0) as i64)
    }

    async fn health(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-memory object store, with a switch to simulate upload failure
#[derive(Default)]
pub struct MemoryFileStore {
    objects: Mutex<HashMap<(String, String), StoredObject>>,
    fail_uploads: AtomicBool,
}

impl MemoryFileStore {
    pub fn fail_uploads(&self) {
        self.fail_uploads.store(true, Ordering::SeqCst);
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StorageError::Upload("simulated upload failure".to_string()));
        }
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), path.to_string()),
            StoredObject {
                content_type: content_type.to_string(),
                content: bytes.to_vec(),
            },
        );
        Ok(public_url(bucket, path))
    }

    async fn get(&self, bucket: &str, path: &str) -> Result<Option<StoredObject>, StorageError> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), path.to_string()))
            .cloned())
    }
}

/// Revalidator that records the paths it was handed
#[derive(Default)]
pub struct RecordingRevalidator {
    paths: Mutex<Vec<String>>,
}

impl RecordingRevalidator {
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().unwrap().clone()
    }
}

impl Revalidator for RecordingRevalidator {
    fn revalidate_path(&self, path: &str) {
        self.paths.lock().unwrap().push(path.to_string());
    }
}

/// One test's worth of application dependencies. `store` is the trait
/// handle the code under test takes; `memory` is the same store with
/// its concrete inspection methods still visible.
pub struct TestEnv {
    pub store: Arc<dyn Datastore>,
    pub memory: Arc<MemoryStore>,
    pub files: Arc<MemoryFileStore>,
    pub revalidator: Arc<RecordingRevalidator>,
}

impl TestEnv {
    /// Assemble an AppState over the in-memory implementations, for
    /// router-level tests.
    pub fn state(&self) -> AppState {
        AppState::new(self.store.clone(), self.files.clone(), self.revalidator.clone())
    }
}

pub fn test_env() -> TestEnv {
    let memory = Arc::new(MemoryStore::default());
    let files = Arc::new(MemoryFileStore::default());
    let revalidator = Arc::new(RecordingRevalidator::default());
    TestEnv {
        store: memory.clone(),
        memory,
        files,
        revalidator,
    }
}

/// Shorthand for building a submitted form field set
pub fn field_set(pairs: &[(&str, &str)]) -> FieldSet {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect()
}
