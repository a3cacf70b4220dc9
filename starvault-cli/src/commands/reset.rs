use super::session::{confirm, CmdResult, Session, Settings};

/// Erase the document everywhere: the remote copy (when signed in) and the
/// local vault.
pub async fn run_reset(settings: &Settings, yes: bool) -> CmdResult {
    let session = Session::open(settings, false).await?;

    if !yes && !confirm("Erase the document locally and remotely? This cannot be undone.")? {
        println!("Aborted.");
        return Ok(());
    }

    let report = session.engine.reset().await?;
    if session.engine.is_online() && !report.remote_deleted {
        eprintln!("Warning: the remote copy could not be deleted; it will be restored on next load.");
    }
    println!("Document erased.");
    Ok(())
}
