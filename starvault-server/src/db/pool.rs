use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::error::{Result, ServerError};

/// Create a PostgreSQL connection pool with sensible defaults.
///
/// - max_connections: 10
/// - acquire_timeout: 5 seconds
pub async fn create_pool(url: &str) -> Result<PgPool> {
    let pool: PgPool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await
        .map_err(|e| ServerError::Database(format!("failed to connect to database: {e}")))?;

    tracing::info!("database connection pool created");
    Ok(pool)
}

/// Run the schema migration (idempotent, uses IF NOT EXISTS).
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS documents (
            user_id        TEXT PRIMARY KEY,
            encrypted_data TEXT NOT NULL,
            nonce          TEXT NOT NULL,
            updated_at     TIMESTAMPTZ NOT NULL,
            stored_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| ServerError::Database(format!("migration (documents) failed: {e}")))?;

    tracing::info!("database migrations applied");
    Ok(())
}
