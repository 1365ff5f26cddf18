use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgArguments, PgPool, Row as SqlxRow};
use uuid::Uuid;

use crate::database::store::{Datastore, ListQuery, Row, StoreError};

/// Postgres-backed store. One pool for the whole process; the database
/// is the sole arbiter of write atomicity and ordering.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Validate identifiers interpolated into SQL. Everything else is bound.
    fn check_identifier(name: &str) -> Result<(), StoreError> {
        let ok = !name.is_empty()
            && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if ok {
            Ok(())
        } else {
            Err(StoreError::QueryError(format!("invalid identifier: {}", name)))
        }
    }

    fn quote(name: &str) -> String {
        format!("\"{}\"", name)
    }

    /// Render WHERE clause for a ListQuery, collecting bind parameters
    fn where_clause(query: &ListQuery, params: &mut Vec<Value>) -> Result<String, StoreError> {
        let mut conditions = Vec::new();
        for (column, value) in &query.eq {
            Self::check_identifier(column)?;
            params.push(value.clone());
            conditions.push(format!("{} = ${}", Self::quote(column), params.len()));
        }
        if let Some((column, term)) = &query.search {
            Self::check_identifier(column)?;
            params.push(Value::String(format!("%{}%", term)));
            conditions.push(format!("{} ILIKE ${}", Self::quote(column), params.len()));
        }
        if conditions.is_empty() {
            Ok(String::new())
        } else {
            Ok(format!(" WHERE {}", conditions.join(" AND ")))
        }
    }
}

#[async_trait]
impl Datastore for PgStore {
    async fn insert(&self, table: &str, fields: &Row) -> Result<Uuid, StoreError> {
        Self::check_identifier(table)?;
        let mut columns = Vec::new();
        let mut placeholders = Vec::new();
        let mut params: Vec<Value> = Vec::new();
        for (column, value) in fields {
            Self::check_identifier(column)?;
            params.push(value.clone());
            columns.push(Self::quote(column));
            placeholders.push(format!("${}", params.len()));
        }
        if columns.is_empty() {
            return Err(StoreError::QueryError("no columns to insert".to_string()));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING id",
            Self::quote(table),
            columns.join(", "),
            placeholders.join(", ")
        );

        let mut q = sqlx::query(&sql);
        for p in params.iter() {
            q = bind_value(q, p);
        }
        let row = q.fetch_one(&self.pool).await?;
        let id: Uuid = row.try_get("id")?;
        Ok(id)
    }

    async fn update(&self, table: &str, id: Uuid, fields: &Row) -> Result<(), StoreError> {
        Self::check_identifier(table)?;
        let mut assignments = Vec::new();
        let mut params: Vec<Value> = Vec::new();
        for (column, value) in fields {
            Self::check_identifier(column)?;
            params.push(value.clone());
            assignments.push(format!("{} = ${}", Self::quote(column), params.len()));
        }
        if assignments.is_empty() {
            return Err(StoreError::QueryError("no columns to update".to_string()));
        }
        assignments.push("updated_at = now()".to_string());

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ${}",
            Self::quote(table),
            assignments.join(", "),
            params.len() + 1
        );

        let mut q = sqlx::query(&sql);
        for p in params.iter() {
            q = bind_value(q, p);
        }
        let result = q.bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("{} record {} not found", table, id)));
        }
        Ok(())
    }

    async fn delete(&self, table: &str, id: Uuid) -> Result<(), StoreError> {
        Self::check_identifier(table)?;
        let sql = format!("DELETE FROM {} WHERE id = $1", Self::quote(table));
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("{} record {} not found", table, id)));
        }
        Ok(())
    }

    async fn upsert(&self, table: &str, conflict_keys: &[&str], rows: &[Row]) -> Result<(), StoreError> {
        Self::check_identifier(table)?;
        let first = match rows.first() {
            Some(row) => row,
            None => return Err(StoreError::QueryError("no rows to upsert".to_string())),
        };

        let columns: Vec<String> = first.keys().cloned().collect();
        for column in &columns {
            Self::check_identifier(column)?;
        }
        for key in conflict_keys {
            Self::check_identifier(key)?;
        }

        let mut params: Vec<Value> = Vec::new();
        let mut tuples = Vec::new();
        for row in rows {
            let mut placeholders = Vec::new();
            for column in &columns {
                params.push(row.get(column).cloned().unwrap_or(Value::Null));
                placeholders.push(format!("${}", params.len()));
            }
            tuples.push(format!("({})", placeholders.join(", ")));
        }

        // Non-key columns are overwritten on conflict: last writer wins
        let updates: Vec<String> = columns
            .iter()
            .filter(|c| !conflict_keys.contains(&c.as_str()))
            .map(|c| format!("{} = EXCLUDED.{}", Self::quote(c), Self::quote(c)))
            .collect();
        let conflict_action = if updates.is_empty() {
            "DO NOTHING".to_string()
        } else {
            format!("DO UPDATE SET {}", updates.join(", "))
        };

        let quoted_keys: Vec<String> = conflict_keys.iter().map(|k| Self::quote(k)).collect();
        let quoted_columns: Vec<String> = columns.iter().map(|c| Self::quote(c)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES {} ON CONFLICT ({}) {}",
            Self::quote(table),
            quoted_columns.join(", "),
            tuples.join(", "),
            quoted_keys.join(", "),
            conflict_action
        );

        let mut q = sqlx::query(&sql);
        for p in params.iter() {
            q = bind_value(q, p);
        }
        q.execute(&self.pool).await?;
        Ok(())
    }

    async fn select(&self, table: &str, query: &ListQuery) -> Result<Vec<Row>, StoreError> {
        Self::check_identifier(table)?;
        let mut params: Vec<Value> = Vec::new();
        let mut sql = format!("SELECT * FROM {}", Self::quote(table));
        sql.push_str(&Self::where_clause(query, &mut params)?);

        if let Some((column, direction)) = &query.order {
            Self::check_identifier(column)?;
            sql.push_str(&format!(" ORDER BY {} {}", Self::quote(column), direction.to_sql()));
        }
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {}", limit.max(0)));
        }
        if let Some(offset) = query.offset {
            sql.push_str(&format!(" OFFSET {}", offset.max(0)));
        }

        // row_to_json gives automatic column mapping for any entity table
        let wrapped = format!("SELECT row_to_json(t) AS row FROM ({}) t", sql);

        let mut q = sqlx::query(&wrapped);
        for p in params.iter() {
            q = bind_value(q, p);
        }
        let rows = q.fetch_all(&self.pool).await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let value: Value = row.try_get("row")?;
            match value {
                Value::Object(map) => out.push(map),
                other => {
                    return Err(StoreError::QueryError(format!(
                        "unexpected row format: {}",
                        other
                    )))
                }
            }
        }
        Ok(out)
    }

    async fn select_by_id(&self, table: &str, id: Uuid) -> Result<Option<Row>, StoreError> {
        Self::check_identifier(table)?;
        let sql = format!(
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM {} WHERE id = $1) t",
            Self::quote(table)
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        match row {
            Some(row) => {
                let value: Value = row.try_get("row")?;
                match value {
                    Value::Object(map) => Ok(Some(map)),
                    other => Err(StoreError::QueryError(format!("unexpected row format: {}", other))),
                }
            }
            None => Ok(None),
        }
    }

    async fn count(&self, table: &str, query: &ListQuery) -> Result<i64, StoreError> {
        Self::check_identifier(table)?;
        let mut params: Vec<Value> = Vec::new();
        let mut sql = format!("SELECT COUNT(*) AS count FROM {}", Self::quote(table));
        sql.push_str(&Self::where_clause(query, &mut params)?);

        let mut q = sqlx::query(&sql);
        for p in params.iter() {
            q = bind_value(q, p);
        }
        let row = q.fetch_one(&self.pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }

    async fn health(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn bind_value<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s),
        // Arrays and objects land in jsonb columns
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()),
    }
}
