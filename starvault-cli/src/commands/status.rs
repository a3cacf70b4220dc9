use starvault_core::traits::{Identity, LocalVault};

use super::session::{CmdResult, Settings};
use crate::platform::EnvIdentity;
use crate::storage::SqliteVault;

/// Show where the document lives. Needs no password: only sealed bytes
/// and the activity log are inspected.
pub async fn run_status(settings: &Settings) -> CmdResult {
    let path = settings.vault_path();
    if !path.exists() {
        return Err(format!(
            "No vault found at {}. Run `starvault init` first.",
            path.display()
        )
        .into());
    }
    let vault = SqliteVault::open(&path)?;

    println!("StarVault Status");
    println!("================");
    println!("  Vault:    {}", vault.path().display());

    match vault.load_snapshot().await? {
        Some(blob) => println!("  Snapshot: {} encrypted bytes", blob.cipher.len()),
        None => println!("  Snapshot: (none)"),
    }

    if let Some(last) = vault.read_log(1).await?.pop() {
        println!(
            "  Last:     {} at {}",
            last.action,
            last.timestamp.format("%Y-%m-%d %H:%M:%S")
        );
    }

    println!();
    match &settings.server {
        Some(server) => println!("  Server:   {server}"),
        None => println!("  Server:   (offline)"),
    }
    match EnvIdentity::new(settings.user.clone()).current_user_id() {
        Some(user) => println!("  User:     {user}"),
        None => println!("  User:     (signed out)"),
    }
    Ok(())
}
