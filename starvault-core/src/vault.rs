//! In-process [`LocalVault`] used by tests and by hosts that keep nothing
//! on disk.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::activity::LogEntry;
use crate::crypto::SealedBlob;
use crate::error::StarVaultError;
use crate::traits::LocalVault;

#[derive(Debug, Default)]
pub struct MemoryVault {
    inner: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    snapshot: Option<SealedBlob>,
    log: Vec<LogEntry>,
    writes: usize,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snapshot writes since creation.
    pub async fn snapshot_writes(&self) -> usize {
        self.inner.lock().await.writes
    }
}

#[async_trait]
impl LocalVault for MemoryVault {
    async fn save_snapshot(&self, blob: &SealedBlob) -> Result<(), StarVaultError> {
        let mut state = self.inner.lock().await;
        state.snapshot = Some(blob.clone());
        state.writes += 1;
        Ok(())
    }

    async fn load_snapshot(&self) -> Result<Option<SealedBlob>, StarVaultError> {
        Ok(self.inner.lock().await.snapshot.clone())
    }

    async fn append_log(&self, entry: &LogEntry) -> Result<(), StarVaultError> {
        self.inner.lock().await.log.push(entry.clone());
        Ok(())
    }

    async fn read_log(&self, limit: usize) -> Result<Vec<LogEntry>, StarVaultError> {
        let state = self.inner.lock().await;
        let start = state.log.len().saturating_sub(limit);
        Ok(state.log[start..].to_vec())
    }

    async fn destroy(&self) -> Result<(), StarVaultError> {
        let mut state = self.inner.lock().await;
        state.snapshot = None;
        state.log.clear();
        Ok(())
    }
}
