//! Save/load orchestration across the local vault and the remote store.

pub mod config;
pub mod engine;

pub use config::SyncConfig;
pub use engine::{LoadOutcome, LoadSource, ResetReport, SaveReport, SyncEngine, SyncEngineBuilder};
