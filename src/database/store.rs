use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

/// Errors surfaced by the data-access boundary
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Sort direction for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Declarative read query: exact-match filters, a single search column,
/// ordering and range pagination. The store translates this into SQL
/// (or an in-memory scan in tests).
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Column = value equality filters, ANDed together
    pub eq: Vec<(String, Value)>,
    /// Case-insensitive substring match on one column
    pub search: Option<(String, String)>,
    pub order: Option<(String, SortDirection)>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.eq.push((column.into(), value.into()));
        self
    }

    pub fn search(mut self, column: impl Into<String>, term: impl Into<String>) -> Self {
        self.search = Some((column.into(), term.into()));
        self
    }

    pub fn order(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.order = Some((column.into(), direction));
        self
    }

    pub fn range(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }
}

/// A database row in wire form: column name to JSON value
pub type Row = Map<String, Value>;

/// The data-access handle threaded through the application.
///
/// All durable state lives behind this trait; the Postgres
/// implementation is the production store and an in-memory
/// implementation backs the unit tests. Every method is a single
/// write/read attempt with no retry - failures surface to the caller.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Insert a row and return the server-generated identifier
    async fn insert(&self, table: &str, fields: &Row) -> Result<Uuid, StoreError>;

    /// Overwrite the given columns of the row with this identifier
    async fn update(&self, table: &str, id: Uuid, fields: &Row) -> Result<(), StoreError>;

    /// Remove the row with this identifier
    async fn delete(&self, table: &str, id: Uuid) -> Result<(), StoreError>;

    /// Multi-row upsert with an explicit conflict key: rows matching an
    /// existing row on the conflict columns overwrite it, others insert
    async fn upsert(&self, table: &str, conflict_keys: &[&str], rows: &[Row]) -> Result<(), StoreError>;

    async fn select(&self, table: &str, query: &ListQuery) -> Result<Vec<Row>, StoreError>;

    async fn select_by_id(&self, table: &str, id: Uuid) -> Result<Option<Row>, StoreError>;

    /// Exact count of rows matching the query's filters
    async fn count(&self, table: &str, query: &ListQuery) -> Result<i64, StoreError>;

    /// Connectivity check for the health endpoint
    async fn health(&self) -> Result<(), StoreError>;
}
