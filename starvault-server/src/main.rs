mod config;
mod error;
mod state;
mod db;
mod api;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("starvault_server=info,tower_http=info")),
        )
        .init();

    tracing::info!("StarVault Server starting...");

    // Load .env file if present (non-fatal if missing).
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("no .env file loaded: {e}");
    }

    let config = Config::from_env();
    tracing::info!(
        http_port = config.http_port,
        max_document_bytes = config.max_document_bytes,
        "configuration loaded"
    );

    let pool = match db::pool::create_pool(&config.database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "failed to create database pool");
            std::process::exit(1);
        }
    };

    if let Err(e) = db::pool::run_migrations(&pool).await {
        tracing::error!(error = %e, "failed to run database migrations");
        std::process::exit(1);
    }

    let state = Arc::new(AppState { pool });
    let router = api::build_router(state, config.max_document_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, "failed to bind HTTP listener");
            std::process::exit(1);
        }
    };

    tracing::info!(%addr, "StarVault Server running");

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Axum server error");
        std::process::exit(1);
    }

    tracing::info!("StarVault Server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
