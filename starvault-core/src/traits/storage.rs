use async_trait::async_trait;

use crate::activity::LogEntry;
use crate::crypto::SealedBlob;
use crate::error::StarVaultError;

/// Device-local persistence: one sealed snapshot plus an append-only
/// activity log. Implementations never see plaintext.
#[async_trait]
pub trait LocalVault: Send + Sync {
    /// Replace the stored snapshot.
    async fn save_snapshot(&self, blob: &SealedBlob) -> Result<(), StarVaultError>;
    async fn load_snapshot(&self) -> Result<Option<SealedBlob>, StarVaultError>;
    async fn append_log(&self, entry: &LogEntry) -> Result<(), StarVaultError>;
    /// The most recent `limit` entries, oldest first.
    async fn read_log(&self, limit: usize) -> Result<Vec<LogEntry>, StarVaultError>;
    /// Remove the snapshot and the log.
    async fn destroy(&self) -> Result<(), StarVaultError>;
}
