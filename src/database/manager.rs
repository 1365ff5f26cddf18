use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::{info, warn};

use crate::config;
use crate::database::store::StoreError;

/// Build the process-wide connection pool from DATABASE_URL.
///
/// The pool connects lazily so the server can come up (and report a
/// degraded health status) before the database is reachable.
pub fn connect() -> Result<PgPool, StoreError> {
    let url = std::env::var("DATABASE_URL").map_err(|_| StoreError::ConfigMissing("DATABASE_URL"))?;
    let db = config::config();

    let pool = PgPoolOptions::new()
        .max_connections(db.database.max_connections)
        .acquire_timeout(Duration::from_secs(db.database.connection_timeout))
        .connect_lazy(&url)?;

    info!("Database pool configured (max_connections={})", db.database.max_connections);
    Ok(pool)
}

/// Apply embedded migrations. A failure is logged and reported but the
/// caller may choose to keep serving (health will show degraded).
pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    match sqlx::migrate!("./migrations").run(pool).await {
        Ok(()) => {
            info!("Database migrations up to date");
            Ok(())
        }
        Err(e) => {
            warn!("Migration run failed: {}", e);
            Err(StoreError::MigrationError(e.to_string()))
        }
    }
}
