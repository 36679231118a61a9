mod config;
mod db;
mod frame;
mod routes;
mod services;
mod state;
mod throttle;

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{AuthMode, Config};
use crate::services::document::{DocumentStore, MemoryDocumentStore, PgDocumentStore};
use crate::services::identity::{DevIdentity, IdentityProvider, PgSessionIdentity};

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // A missing .env file is the normal case outside development.
    if let Err(e) = dotenv {
        if !e.not_found() {
            tracing::warn!(error = %e, "failed to read .env");
        }
    }

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            tracing::error!(%message, "sketchroom failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), String> {
    let config = Config::from_env().map_err(|e| format!("config: {e}"))?;

    let (documents, identity): (Arc<dyn DocumentStore>, Arc<dyn IdentityProvider>) = match &config.database_url {
        Some(url) => {
            let pool = db::init_pool(url, config.db_max_connections)
                .await
                .map_err(|e| format!("database init failed: {e}"))?;
            let identity: Arc<dyn IdentityProvider> = match config.auth_mode {
                AuthMode::Session => Arc::new(PgSessionIdentity::new(pool.clone())),
                AuthMode::Dev => Arc::new(DevIdentity),
            };
            (Arc::new(PgDocumentStore::new(pool)), identity)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, documents are kept in memory");
            (Arc::new(MemoryDocumentStore::new()), Arc::new(DevIdentity))
        }
    };
    if config.auth_mode == AuthMode::Dev {
        tracing::warn!("AUTH_MODE=dev: tokens are accepted as user ids");
    }

    let addr = config.socket_addr();
    let state = state::AppState::new(config, documents, identity);
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("failed to bind {addr}: {e}"))?;

    tracing::info!(%addr, "sketchroom listening");
    axum::serve(listener, app)
        .await
        .map_err(|e| format!("server failed: {e}"))
}
