use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::SyncConfig;
use crate::activity::{LogEntry, ACTION_IMPORT, ACTION_LOAD, ACTION_RESET};
use crate::codec::{self, RestoreReport};
use crate::crypto::{self, KeyMaterial, SealedBlob};
use crate::error::{Result, StarVaultError};
use crate::model::Cosmos;
use crate::traits::{Anonymous, Clock, Identity, LocalVault, RemoteDocument, RemoteStore, SystemClock};

/// Where a loaded document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    Local,
}

impl LoadSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadSource::Remote => "remote",
            LoadSource::Local => "local",
        }
    }
}

#[derive(Debug)]
pub enum LoadOutcome {
    /// Neither tier holds a document: first run.
    Empty,
    Restored {
        cosmos: Cosmos,
        report: RestoreReport,
        source: LoadSource,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    /// The vault accepted the snapshot.
    pub stored_locally: bool,
    /// A debounced remote write is now pending.
    pub push_scheduled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetReport {
    /// The remote document was deleted (false when offline or signed out).
    pub remote_deleted: bool,
}

struct PendingPush {
    generation: u64,
    user_id: String,
    blob: SealedBlob,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct PushQueue {
    generation: u64,
    pending: Option<PendingPush>,
}

struct Shared {
    vault: Arc<dyn LocalVault>,
    remote: Option<Arc<dyn RemoteStore>>,
    identity: Arc<dyn Identity>,
    clock: Arc<dyn Clock>,
    key: Arc<KeyMaterial>,
    config: SyncConfig,
    /// Serializes writes to the single snapshot slot.
    snapshot_lock: Mutex<()>,
    queue: Mutex<PushQueue>,
}

pub struct SyncEngineBuilder {
    vault: Arc<dyn LocalVault>,
    key: Arc<KeyMaterial>,
    remote: Option<Arc<dyn RemoteStore>>,
    identity: Arc<dyn Identity>,
    clock: Arc<dyn Clock>,
    config: SyncConfig,
}

impl SyncEngineBuilder {
    pub fn remote(mut self, remote: Arc<dyn RemoteStore>, identity: Arc<dyn Identity>) -> Self {
        self.remote = Some(remote);
        self.identity = identity;
        self
    }

    pub fn config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> SyncEngine {
        SyncEngine {
            shared: Arc::new(Shared {
                vault: self.vault,
                remote: self.remote,
                identity: self.identity,
                clock: self.clock,
                key: self.key,
                config: self.config,
                snapshot_lock: Mutex::new(()),
                queue: Mutex::new(PushQueue::default()),
            }),
        }
    }
}

/// Policy layer over the vault and the remote store.
///
/// The vault write on save is always awaited; the remote write is debounced
/// and only ever carries the newest blob. Vault and network failures are
/// logged and absorbed; a decryption failure on load is returned.
///
/// Callers must not `load` while a debounced push is pending; `flush` first.
#[derive(Clone)]
pub struct SyncEngine {
    shared: Arc<Shared>,
}

impl SyncEngine {
    /// Local-only engine. Add a remote with [`SyncEngineBuilder::remote`].
    pub fn builder(vault: Arc<dyn LocalVault>, key: Arc<KeyMaterial>) -> SyncEngineBuilder {
        SyncEngineBuilder {
            vault,
            key,
            remote: None,
            identity: Arc::new(Anonymous),
            clock: Arc::new(SystemClock),
            config: SyncConfig::default(),
        }
    }

    pub fn key(&self) -> &KeyMaterial {
        &self.shared.key
    }

    pub fn config(&self) -> &SyncConfig {
        &self.shared.config
    }

    pub fn vault(&self) -> &Arc<dyn LocalVault> {
        &self.shared.vault
    }

    pub fn user_id(&self) -> Option<String> {
        self.shared.identity.current_user_id()
    }

    /// True when a remote is configured and someone is signed in.
    pub fn is_online(&self) -> bool {
        self.shared.signed_in_user().is_some()
    }

    pub async fn has_pending_push(&self) -> bool {
        self.shared.queue.lock().await.pending.is_some()
    }

    /// Flatten, encrypt, store locally, then (re)arm the remote debounce.
    pub async fn save(&self, cosmos: &Cosmos) -> Result<SaveReport> {
        let doc = codec::flatten(cosmos);
        let key = Arc::clone(&self.shared.key);
        let blob = tokio::task::spawn_blocking(move || -> Result<SealedBlob> {
            let plaintext = codec::serialize(&doc)?;
            Ok(crypto::encrypt(&plaintext, &key)?)
        })
        .await
        .map_err(|e| StarVaultError::Platform(format!("seal task failed: {e}")))??;

        self.commit(blob).await
    }

    /// Commit a blob that has already been verified against the current key
    /// (an imported capsule).
    pub async fn adopt(&self, blob: SealedBlob) -> Result<SaveReport> {
        let report = self.commit(blob).await?;
        self.record(ACTION_IMPORT, json!({ "storedLocally": report.stored_locally }))
            .await;
        Ok(report)
    }

    async fn commit(&self, blob: SealedBlob) -> Result<SaveReport> {
        let stored_locally = self.shared.store_snapshot(&blob).await;
        let push_scheduled = self.schedule_push(blob).await;
        Ok(SaveReport {
            stored_locally,
            push_scheduled,
        })
    }

    async fn schedule_push(&self, blob: SealedBlob) -> bool {
        let Some(user_id) = self.shared.signed_in_user() else {
            return false;
        };

        let mut queue = self.shared.queue.lock().await;
        if let Some(superseded) = queue.pending.take() {
            superseded.timer.abort();
            debug!(generation = superseded.generation, "superseded pending push");
        }
        queue.generation += 1;
        let generation = queue.generation;

        let shared = Arc::clone(&self.shared);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(shared.config.debounce).await;
            let due = {
                let mut queue = shared.queue.lock().await;
                let current = queue
                    .pending
                    .as_ref()
                    .is_some_and(|p| p.generation == generation);
                if current {
                    queue.pending.take()
                } else {
                    None
                }
            };
            if let Some(due) = due {
                if let Err(e) = shared.push(&due.user_id, &due.blob).await {
                    warn!(user_id = %due.user_id, error = %e, "remote save failed; local copy kept");
                }
            }
        });

        queue.pending = Some(PendingPush {
            generation,
            user_id,
            blob,
            timer,
        });
        true
    }

    /// Send the pending remote write now instead of waiting out the
    /// debounce. Returns whether anything was pending.
    pub async fn flush(&self) -> Result<bool> {
        let pending = self.shared.queue.lock().await.pending.take();
        let Some(pending) = pending else {
            return Ok(false);
        };
        pending.timer.abort();
        self.shared.push(&pending.user_id, &pending.blob).await?;
        Ok(true)
    }

    /// Remote first (authoritative, bounded by `fetch_timeout`), then the
    /// vault. A blob that will not decrypt is an error, never an empty
    /// document.
    pub async fn load(&self) -> Result<LoadOutcome> {
        let (blob, source) = match self.fetch_remote().await {
            Some(blob) => {
                self.shared.store_snapshot(&blob).await;
                (blob, LoadSource::Remote)
            }
            None => match self.shared.vault.load_snapshot().await? {
                Some(blob) => (blob, LoadSource::Local),
                None => {
                    info!("no document found locally or remotely");
                    return Ok(LoadOutcome::Empty);
                }
            },
        };

        let key = Arc::clone(&self.shared.key);
        let restored = tokio::task::spawn_blocking(move || codec::open(&blob, &key))
            .await
            .map_err(|e| StarVaultError::Platform(format!("open task failed: {e}")))??;

        info!(
            source = source.as_str(),
            nodes = restored.cosmos.len(),
            "document loaded"
        );
        self.record(
            ACTION_LOAD,
            json!({
                "source": source.as_str(),
                "nodes": restored.cosmos.len(),
                "droppedLinks": restored.report.dropped_links,
                "droppedWormholes": restored.report.dropped_wormholes,
            }),
        )
        .await;

        Ok(LoadOutcome::Restored {
            cosmos: restored.cosmos,
            report: restored.report,
            source,
        })
    }

    async fn fetch_remote(&self) -> Option<SealedBlob> {
        let remote = self.shared.remote.as_ref()?;
        let user_id = self.shared.signed_in_user()?;
        let timeout = self.shared.config.fetch_timeout;

        match tokio::time::timeout(timeout, remote.fetch_authoritative(&user_id)).await {
            Ok(Ok(Some(doc))) => match doc.to_blob() {
                Ok(blob) => {
                    debug!(user_id = %user_id, updated_at = %doc.updated_at, "fetched remote document");
                    Some(blob)
                }
                Err(e) => {
                    warn!(user_id = %user_id, error = %e, "remote document unreadable; using local vault");
                    None
                }
            },
            Ok(Ok(None)) => {
                debug!(user_id = %user_id, "no remote document");
                None
            }
            Ok(Err(e)) => {
                warn!(user_id = %user_id, error = %e, "remote unavailable; using local vault");
                None
            }
            Err(_) => {
                warn!(user_id = %user_id, ?timeout, "remote fetch timed out; using local vault");
                None
            }
        }
    }

    /// Delete the remote document (when reachable) and destroy the vault.
    pub async fn reset(&self) -> Result<ResetReport> {
        if let Some(pending) = self.shared.queue.lock().await.pending.take() {
            pending.timer.abort();
        }

        let mut remote_deleted = false;
        if let (Some(remote), Some(user_id)) = (&self.shared.remote, self.shared.signed_in_user()) {
            let timeout = self.shared.config.push_timeout;
            match tokio::time::timeout(timeout, remote.delete(&user_id)).await {
                Ok(Ok(())) => remote_deleted = true,
                Ok(Err(e)) => warn!(user_id = %user_id, error = %e, "remote delete failed"),
                Err(_) => warn!(user_id = %user_id, ?timeout, "remote delete timed out"),
            }
        }

        {
            let _guard = self.shared.snapshot_lock.lock().await;
            self.shared.vault.destroy().await?;
        }
        info!(remote_deleted, "document reset");
        self.record(ACTION_RESET, json!({ "remoteDeleted": remote_deleted }))
            .await;
        Ok(ResetReport { remote_deleted })
    }

    /// Append to the activity log. Failures are logged and ignored.
    pub async fn record(&self, action: &str, detail: Value) {
        let entry = LogEntry::new(self.shared.clock.now(), action, detail);
        if let Err(e) = self.shared.vault.append_log(&entry).await {
            warn!(action, error = %e, "activity log append failed");
        }
    }

    pub async fn history(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.shared.vault.read_log(limit).await
    }
}

impl Shared {
    /// The user remote traffic goes to: only with a remote configured and
    /// an identity that reports itself signed in.
    fn signed_in_user(&self) -> Option<String> {
        self.remote.as_ref()?;
        if !self.identity.is_signed_in() {
            return None;
        }
        self.identity.current_user_id()
    }

    async fn store_snapshot(&self, blob: &SealedBlob) -> bool {
        let _guard = self.snapshot_lock.lock().await;
        match self.vault.save_snapshot(blob).await {
            Ok(()) => {
                debug!(bytes = blob.cipher.len(), "snapshot stored locally");
                true
            }
            Err(e) => {
                warn!(error = %e, "local snapshot write failed");
                false
            }
        }
    }

    async fn push(&self, user_id: &str, blob: &SealedBlob) -> Result<()> {
        let Some(remote) = &self.remote else {
            return Ok(());
        };
        let doc = RemoteDocument::from_blob(blob, self.clock.now());
        let timeout = self.config.push_timeout;
        tokio::time::timeout(timeout, remote.upsert(user_id, &doc))
            .await
            .map_err(|_| StarVaultError::Timeout(timeout))??;
        info!(user_id = %user_id, bytes = blob.cipher.len(), "remote document updated");
        Ok(())
    }
}
