use starvault_core::model::Cosmos;
use starvault_core::sync::LoadOutcome;

use super::session::{CmdResult, Session, Settings};

/// Create the starter document, unless one already exists locally or
/// remotely.
pub async fn run_init(settings: &Settings, name: Option<String>) -> CmdResult {
    let session = Session::open(settings, true).await?;

    if let LoadOutcome::Restored { source, .. } = session.engine.load().await? {
        return Err(format!(
            "A document already exists ({} copy). Use `starvault reset` to start over.",
            source.as_str()
        )
        .into());
    }

    let name = name
        .or_else(|| settings.user.clone())
        .unwrap_or_else(|| "My Universe".to_string());
    let cosmos = Cosmos::genesis(name.as_str());
    session.commit(&cosmos).await?;

    println!("Document '{name}' created in {}", settings.dir.display());
    println!("Key fingerprint: {}", session.key().fingerprint());
    println!("Remember your password -- there is no recovery mechanism.");
    Ok(())
}
