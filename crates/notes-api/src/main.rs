//! # notes-api: Binary Entry Point
//!
//! Reads configuration, connects to Postgres when `DATABASE_URL` is set,
//! hydrates the note store, and serves the API until Ctrl-C.

use anyhow::Context;
use notes_api::config::{AppConfig, LogFormat};
use notes_api::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    if config.jwt_secret_ephemeral {
        tracing::warn!(
            "NOTES_JWT_SECRET not set, using a random secret. Tokens will not survive restarts."
        );
    }
    if config.users.is_empty() {
        tracing::warn!("NOTES_USERS is empty, nobody can obtain a token");
    }

    let db_pool = notes_api::db::init_pool(&config).await.map_err(|e| {
        tracing::error!("database initialization failed: {e}");
        e
    })?;

    let port = config.port;
    let state = AppState::with_config(config, db_pool);
    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("database hydration failed: {e}");
        e
    })?;

    let app = notes_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("notes API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
