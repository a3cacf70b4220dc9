use sqlx::PgPool;

/// Shared application state passed to all handlers via Axum's State extractor.
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
}
