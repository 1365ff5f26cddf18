use async_trait::async_trait;
use sqlx::{PgPool, Row as SqlxRow};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// An object read back from a bucket
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: String,
    pub content: Vec<u8>,
}

/// Row-level file storage boundary: a binary upload into a named
/// bucket under a generated path, retrievable by its public URL.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store the bytes and return the public URL they are served from
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError>;

    async fn get(&self, bucket: &str, path: &str) -> Result<Option<StoredObject>, StorageError>;
}

/// Generate a collision-free storage path for an uploaded file name
pub fn generate_path(file_name: &str) -> String {
    // Keep the original name for download friendliness, namespaced by a
    // random prefix
    let safe: String = file_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{}/{}", Uuid::new_v4().simple(), safe)
}

pub fn public_url(bucket: &str, path: &str) -> String {
    format!("/files/{}/{}", bucket, path)
}

/// Postgres-backed object store (one row per object)
pub struct PgFileStore {
    pool: PgPool,
}

impl PgFileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileStore for PgFileStore {
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        sqlx::query(
            "INSERT INTO storage_objects (bucket, path, content_type, content) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (bucket, path) DO UPDATE SET content_type = EXCLUDED.content_type, content = EXCLUDED.content",
        )
        .bind(bucket)
        .bind(path)
        .bind(content_type)
        .bind(bytes)
        .execute(&self.pool)
        .await?;

        Ok(public_url(bucket, path))
    }

    async fn get(&self, bucket: &str, path: &str) -> Result<Option<StoredObject>, StorageError> {
        let row = sqlx::query(
            "SELECT content_type, content FROM storage_objects WHERE bucket = $1 AND path = $2",
        )
        .bind(bucket)
        .bind(path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(match row {
            Some(row) => Some(StoredObject {
                content_type: row.try_get("content_type")?,
                content: row.try_get("content")?,
            }),
            None => None,
        })
    }
}
