//! Native storage: SQLite-backed vault.

pub mod sqlite_vault;

pub use sqlite_vault::SqliteVault;
