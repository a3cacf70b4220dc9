use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension};
use tokio::sync::Mutex;
use tracing::debug;

use starvault_core::activity::LogEntry;
use starvault_core::crypto::SealedBlob;
use starvault_core::error::StarVaultError;
use starvault_core::traits::LocalVault;

/// Current on-disk schema. v1: snapshot slot. v2: activity log.
pub const SCHEMA_VERSION: i64 = 2;

const SNAPSHOT_SLOT: &str = "latest_capsule";

/// [`LocalVault`] backed by a single SQLite file.
///
/// Synchronous rusqlite calls are wrapped in `tokio::task::spawn_blocking`.
pub struct SqliteVault {
    conn: Arc<Mutex<Connection>>,
    db_path: PathBuf,
}

impl SqliteVault {
    /// Open (or create) the vault database and bring its schema up to date.
    pub fn open(db_path: &Path) -> Result<Self, StarVaultError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StarVaultError::Storage(format!("create vault dir failed: {e}")))?;
        }

        let mut conn = Connection::open(db_path)
            .map_err(|e| StarVaultError::Storage(format!("open SQLite DB failed: {e}")))?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA secure_delete=ON;")
            .map_err(|e| StarVaultError::Storage(format!("set pragmas failed: {e}")))?;

        migrate(&mut conn)?;
        debug!("Opened SQLite vault at {}", db_path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }
}

/// Apply every schema step above the stored `user_version` in one
/// transaction. Steps only ever add tables, so the snapshot row survives.
fn migrate(conn: &mut Connection) -> Result<(), StarVaultError> {
    let version: i64 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| StarVaultError::Storage(format!("read schema version failed: {e}")))?;
    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    let tx = conn
        .transaction()
        .map_err(|e| StarVaultError::Storage(format!("begin migration failed: {e}")))?;
    if version < 1 {
        tx.execute(
            "CREATE TABLE IF NOT EXISTS snapshot (
                slot  TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| StarVaultError::Storage(format!("create snapshot table failed: {e}")))?;
    }
    if version < 2 {
        tx.execute(
            "CREATE TABLE IF NOT EXISTS activity_log (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                action    TEXT NOT NULL,
                detail    TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| StarVaultError::Storage(format!("create activity_log table failed: {e}")))?;
    }
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)
        .map_err(|e| StarVaultError::Storage(format!("set schema version failed: {e}")))?;
    tx.commit()
        .map_err(|e| StarVaultError::Storage(format!("commit migration failed: {e}")))?;

    debug!("Migrated vault schema from v{} to v{}", version, SCHEMA_VERSION);
    Ok(())
}

#[async_trait]
impl LocalVault for SqliteVault {
    async fn save_snapshot(&self, blob: &SealedBlob) -> Result<(), StarVaultError> {
        let conn = self.conn.clone();
        let value = String::from_utf8(blob.to_json()?)
            .map_err(|e| StarVaultError::Serialization(format!("snapshot is not UTF-8: {e}")))?;

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT OR REPLACE INTO snapshot (slot, value) VALUES (?1, ?2)",
                rusqlite::params![SNAPSHOT_SLOT, value],
            )
            .map_err(|e| StarVaultError::Storage(format!("sqlite snapshot write failed: {e}")))?;

            debug!("Stored snapshot ({} bytes)", value.len());
            Ok(())
        })
        .await
        .map_err(|e| StarVaultError::Storage(format!("spawn_blocking failed: {e}")))?
    }

    async fn load_snapshot(&self) -> Result<Option<SealedBlob>, StarVaultError> {
        let conn = self.conn.clone();

        let value: Option<String> = tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.query_row(
                "SELECT value FROM snapshot WHERE slot = ?1",
                rusqlite::params![SNAPSHOT_SLOT],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StarVaultError::Storage(format!("sqlite snapshot read failed: {e}")))
        })
        .await
        .map_err(|e| StarVaultError::Storage(format!("spawn_blocking failed: {e}")))??;

        value
            .map(|v| SealedBlob::from_json(v.as_bytes()))
            .transpose()
    }

    async fn append_log(&self, entry: &LogEntry) -> Result<(), StarVaultError> {
        let conn = self.conn.clone();
        let timestamp = entry.timestamp.to_rfc3339();
        let action = entry.action.clone();
        let detail = serde_json::to_string(&entry.detail)?;

        tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            conn.execute(
                "INSERT INTO activity_log (timestamp, action, detail) VALUES (?1, ?2, ?3)",
                rusqlite::params![timestamp, action, detail],
            )
            .map_err(|e| StarVaultError::Storage(format!("sqlite log append failed: {e}")))?;
            Ok(())
        })
        .await
        .map_err(|e| StarVaultError::Storage(format!("spawn_blocking failed: {e}")))?
    }

    async fn read_log(&self, limit: usize) -> Result<Vec<LogEntry>, StarVaultError> {
        let conn = self.conn.clone();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows: Vec<(String, String, String)> = tokio::task::spawn_blocking(move || {
            let conn = conn.blocking_lock();
            let mut stmt = conn
                .prepare(
                    "SELECT timestamp, action, detail FROM activity_log
                     ORDER BY id DESC LIMIT ?1",
                )
                .map_err(|e| StarVaultError::Storage(format!("sqlite prepare failed: {e}")))?;

            let rows = stmt
                .query_map(rusqlite::params![limit], |row| {
                    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
                })
                .map_err(|e| StarVaultError::Storage(format!("sqlite query failed: {e}")))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| StarVaultError::Storage(format!("sqlite collect failed: {e}")))?;
            Ok::<_, StarVaultError>(rows)
        })
        .await
        .map_err(|e| StarVaultError::Storage(format!("spawn_blocking failed: {e}")))??;

        rows.into_iter()
            .rev()
            .map(|(timestamp, action, detail)| -> Result<LogEntry, StarVaultError> {
                let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                    .map_err(|e| StarVaultError::Storage(format!("bad log timestamp: {e}")))?
                    .with_timezone(&Utc);
                let detail = serde_json::from_str(&detail).unwrap_or(serde_json::Value::Null);
                Ok(LogEntry::new(timestamp, action, detail))
            })
            .collect()
    }

    async fn destroy(&self) -> Result<(), StarVaultError> {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn.blocking_lock();
            let tx = conn
                .transaction()
                .map_err(|e| StarVaultError::Storage(format!("begin destroy failed: {e}")))?;
            tx.execute("DELETE FROM snapshot", [])
                .map_err(|e| StarVaultError::Storage(format!("clear snapshot failed: {e}")))?;
            tx.execute("DELETE FROM activity_log", [])
                .map_err(|e| StarVaultError::Storage(format!("clear log failed: {e}")))?;
            tx.commit()
                .map_err(|e| StarVaultError::Storage(format!("commit destroy failed: {e}")))?;
            conn.execute_batch("VACUUM;")
                .map_err(|e| StarVaultError::Storage(format!("vacuum failed: {e}")))?;
            // Old pages still sit in the write-ahead log until it is
            // checkpointed and truncated.
            let busy: i64 = conn
                .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |row| row.get(0))
                .map_err(|e| StarVaultError::Storage(format!("checkpoint failed: {e}")))?;
            if busy != 0 {
                return Err(StarVaultError::Storage(
                    "checkpoint blocked; old pages remain in the WAL".to_string(),
                ));
            }

            debug!("Vault destroyed");
            Ok(())
        })
        .await
        .map_err(|e| StarVaultError::Storage(format!("spawn_blocking failed: {e}")))?
    }
}
