//! Best-effort activity log entries kept next to the local snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const ACTION_LOAD: &str = "load";
pub const ACTION_IMPORT: &str = "import";
pub const ACTION_EXPORT: &str = "export";
pub const ACTION_RESET: &str = "reset";
pub const ACTION_ADD: &str = "add";
pub const ACTION_NOTE: &str = "note";
pub const ACTION_BANISH: &str = "banish";
pub const ACTION_PURGE: &str = "purge";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl LogEntry {
    pub fn new(timestamp: DateTime<Utc>, action: impl Into<String>, detail: serde_json::Value) -> Self {
        Self {
            timestamp,
            action: action.into(),
            detail,
        }
    }
}
