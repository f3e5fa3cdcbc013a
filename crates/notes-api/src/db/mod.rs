//! # Database Persistence Layer
//!
//! Postgres persistence for notes via SQLx.
//!
//! The database layer is optional. When `DATABASE_URL` is set, every
//! mutation is written through to the `notes` table and the in-memory store
//! is hydrated from it at startup. When absent, the API runs in-memory only.

pub mod notes;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::AppConfig;

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `config.database_url` is unset (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool(config: &AppConfig) -> Result<Option<PgPool>, sqlx::Error> {
    let Some(url) = config.database_url.as_deref() else {
        tracing::warn!(
            "DATABASE_URL not set, running in-memory only. Notes will not survive restarts."
        );
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("database migrations applied");

    Ok(Some(pool))
}

/// Round-trip a trivial query. Used by the readiness probe.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_database_url_means_in_memory() {
        let pool = init_pool(&AppConfig::default()).await.unwrap();
        assert!(pool.is_none());
    }
}
