use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use starvault_core::activity::ACTION_EXPORT;
use starvault_core::capsule;

use super::session::{confirm, CmdResult, Session, Settings};

/// Write the sealed local snapshot to a `.universe` file.
pub async fn run_export(settings: &Settings, out: Option<PathBuf>) -> CmdResult {
    let session = Session::open(settings, false).await?;
    let bytes = capsule::export(session.engine.vault().as_ref()).await?;

    let path = out.unwrap_or_else(|| PathBuf::from(capsule::file_name(Local::now().date_naive())));
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| format!("failed to write {}: {e}", path.display()))?;

    session
        .engine
        .record(ACTION_EXPORT, serde_json::json!({ "bytes": bytes.len() }))
        .await;
    println!("Exported to {}", path.display());
    Ok(())
}

/// Replace the current document with a capsule, after checking that it
/// opens under the current password.
pub async fn run_import(settings: &Settings, file: &Path, yes: bool) -> CmdResult {
    let bytes = tokio::fs::read(file)
        .await
        .map_err(|e| format!("failed to read {}: {e}", file.display()))?;

    let session = Session::open(settings, false).await?;
    let imported = capsule::import(&bytes, session.key())?;
    info!(report = ?imported.restored.report, "capsule decoded");

    let nodes = imported.restored.cosmos.len();
    let name = imported.restored.cosmos.root().name.clone();
    if !yes && !confirm(&format!("Replace the current document with '{name}' ({nodes} node(s))?"))? {
        println!("Aborted.");
        return Ok(());
    }

    session.engine.adopt(imported.blob).await?;
    if let Err(e) = session.engine.flush().await {
        eprintln!("Warning: remote save failed ({e}); the local copy is kept.");
    }
    println!("Imported '{name}' ({nodes} node(s))");
    Ok(())
}
