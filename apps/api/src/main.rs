mod config;
mod db;
mod errors;
mod intake;
mod models;
mod profiles;
mod routes;
mod state;
mod storage;

#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::profiles::PgProfileStore;
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::build_storage;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; missing required variables abort startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hiredeck API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.db_timeout).await?;
    let profiles = Arc::new(PgProfileStore::new(db, config.db_timeout));

    // Initialize object storage
    let storage = build_storage(&config).await?;
    info!(
        "Storage client initialized (bucket: {}, backend: {})",
        config.bucket,
        config.storage.backend_name()
    );

    let state = AppState {
        storage,
        profiles,
        max_upload_bytes: config.max_upload_bytes,
    };

    // Any origin, method and header, with credentials
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::very_permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
