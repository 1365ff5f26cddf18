use std::sync::Arc;

use party_admin_api::database::{manager, Datastore, PgStore};
use party_admin_api::revalidate::LogRevalidator;
use party_admin_api::state::AppState;
use party_admin_api::storage::{FileStore, PgFileStore};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, SESSION_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = party_admin_api::config::config();
    tracing::info!("Starting party admin API in {:?} mode", config.environment);

    let pool = manager::connect().unwrap_or_else(|e| panic!("database pool: {}", e));
    // Migration failure is tolerated at boot; /health reports degraded until resolved.
    let _ = manager::run_migrations(&pool).await;

    let store: Arc<dyn Datastore> = Arc::new(PgStore::new(pool.clone()));
    let files: Arc<dyn FileStore> = Arc::new(PgFileStore::new(pool));
    let state = AppState::new(store, files, Arc::new(LogRevalidator));

    let app = party_admin_api::app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("ADMIN_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("🚀 Party admin API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
