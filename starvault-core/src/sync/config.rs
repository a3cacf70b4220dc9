use std::time::Duration;

use crate::constants::{DEFAULT_DEBOUNCE, DEFAULT_FETCH_TIMEOUT, DEFAULT_PUSH_TIMEOUT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// Quiet period after the last save before the remote write fires.
    pub debounce: Duration,
    /// Upper bound on the authoritative fetch during load.
    pub fetch_timeout: Duration,
    /// Upper bound on a single remote upsert or delete.
    pub push_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            push_timeout: DEFAULT_PUSH_TIMEOUT,
        }
    }
}
