use super::session::{CmdResult, Session, Settings};

/// Print the most recent activity log entries, oldest first.
pub async fn run_log(settings: &Settings, limit: usize) -> CmdResult {
    let session = Session::open(settings, false).await?;
    let entries = session.engine.history(limit).await?;

    if entries.is_empty() {
        println!("Activity log: (empty)");
        return Ok(());
    }
    for entry in entries {
        let detail = if entry.detail.is_null() {
            String::new()
        } else {
            entry.detail.to_string()
        };
        println!(
            "{}  {:<8} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.action,
            detail
        );
    }
    Ok(())
}
