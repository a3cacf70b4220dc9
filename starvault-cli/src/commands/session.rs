//! Shared plumbing for commands: settings, key derivation, engine wiring,
//! node lookup.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use starvault_core::constants::DEFAULT_KEY_SALT;
use starvault_core::crypto::{derive_key, KeyMaterial};
use starvault_core::model::{Cosmos, NodeId, UniverseRef};
use starvault_core::sync::{LoadOutcome, SyncEngine};

use crate::platform::EnvIdentity;
use crate::storage::SqliteVault;
use crate::transport::HttpRemote;

pub type CmdResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

const VAULT_FILE: &str = "vault.db";

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct Settings {
    pub dir: PathBuf,
    pub server: Option<String>,
    pub user: Option<String>,
    pub salt: Option<String>,
}

impl Settings {
    pub fn vault_path(&self) -> PathBuf {
        self.dir.join(VAULT_FILE)
    }

    fn salt_bytes(&self) -> Vec<u8> {
        match &self.salt {
            Some(salt) => salt.as_bytes().to_vec(),
            None => DEFAULT_KEY_SALT.to_vec(),
        }
    }
}

/// An unlocked engine over the on-disk vault.
pub struct Session {
    pub engine: SyncEngine,
}

impl Session {
    /// Open the vault and derive the key. `confirm` asks for the password
    /// twice when prompting.
    pub async fn open(settings: &Settings, confirm: bool) -> CmdResult<Self> {
        let vault = Arc::new(SqliteVault::open(&settings.vault_path())?);
        let password = read_password(confirm)?;
        let salt = settings.salt_bytes();

        info!("Deriving document key (this may take a moment)...");
        let key = tokio::task::spawn_blocking(move || derive_key(&password, &salt)).await??;

        let mut builder = SyncEngine::builder(vault, Arc::new(key));
        if let Some(server) = &settings.server {
            let remote = HttpRemote::new(server)?;
            let identity = EnvIdentity::new(settings.user.clone());
            builder = builder.remote(Arc::new(remote), Arc::new(identity));
        }

        Ok(Self {
            engine: builder.build(),
        })
    }

    pub fn key(&self) -> &KeyMaterial {
        self.engine.key()
    }

    /// Load the document, failing when none exists yet.
    pub async fn load(&self) -> CmdResult<Cosmos> {
        match self.engine.load().await? {
            LoadOutcome::Restored { cosmos, report, .. } => {
                if !report.is_clean() {
                    warn!(?report, "document needed repair while loading");
                }
                Ok(cosmos)
            }
            LoadOutcome::Empty => Err("No document yet. Run `starvault init` first.".into()),
        }
    }

    /// Save and push immediately; a CLI process does not outlive the debounce.
    pub async fn commit(&self, cosmos: &Cosmos) -> CmdResult {
        let report = self.engine.save(cosmos).await?;
        if !report.stored_locally {
            eprintln!("Warning: the local vault could not be written.");
        }
        if let Err(e) = self.engine.flush().await {
            eprintln!("Warning: remote save failed ({e}); the local copy is kept.");
        }
        Ok(())
    }
}

fn read_password(confirm: bool) -> CmdResult<String> {
    if let Ok(p) = std::env::var("STARVAULT_PASSWORD") {
        return Ok(p);
    }
    let p = rpassword::prompt_password("Enter document password: ")?;
    if p.is_empty() {
        return Err("Password cannot be empty".into());
    }
    if confirm {
        let again = rpassword::prompt_password("Confirm document password: ")?;
        if p != again {
            return Err("Passwords do not match".into());
        }
    }
    Ok(p)
}

/// Ask a yes/no question on stderr; anything but `y` is no.
pub fn confirm(question: &str) -> CmdResult<bool> {
    eprint!("{question} [y/N] ");
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

/// Find a node by exact id, unique id prefix, or unique name.
pub fn resolve(cosmos: &Cosmos, query: &str) -> CmdResult<NodeId> {
    let exact = NodeId::from(query);
    if cosmos.contains(&exact) {
        return Ok(exact);
    }

    let mut all: Vec<NodeId> = cosmos.root().node_ids().to_vec();
    all.extend(cosmos.black_hole().iter().cloned());
    let all: Vec<NodeId> = all.iter().flat_map(|id| cosmos.subtree(id)).collect();

    let by_prefix: Vec<&NodeId> = all.iter().filter(|id| id.as_str().starts_with(query)).collect();
    if let [only] = by_prefix.as_slice() {
        return Ok((*only).clone());
    }
    let by_name: Vec<&NodeId> = all
        .iter()
        .filter(|id| cosmos.node(id).is_some_and(|n| n.name == query))
        .collect();
    match (by_prefix.len(), by_name.as_slice()) {
        (0, [only]) => Ok((*only).clone()),
        (0, []) => Err(format!("No node matches '{query}'").into()),
        _ => Err(format!("'{query}' is ambiguous; use a longer id").into()),
    }
}

/// `None` or `"root"` is the root universe; anything else names the node
/// whose interior is meant.
pub fn resolve_universe(cosmos: &Cosmos, query: Option<&str>) -> CmdResult<UniverseRef> {
    match query {
        None | Some("root") => Ok(UniverseRef::Root),
        Some(q) => Ok(UniverseRef::Inner(resolve(cosmos, q)?)),
    }
}

/// First eight characters of an id, for display.
pub fn short(id: &NodeId) -> &str {
    let s = id.as_str();
    s.char_indices().nth(8).map_or(s, |(i, _)| &s[..i])
}
