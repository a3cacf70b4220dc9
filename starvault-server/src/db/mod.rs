//! PostgreSQL data access layer (one document per user).

pub mod pool;
pub mod documents;
