//! Graph mutations. Each command is load, mutate, save, flush.

use serde_json::json;

use starvault_core::activity::{ACTION_ADD, ACTION_BANISH, ACTION_NOTE, ACTION_PURGE};
use starvault_core::model::{Category, NodeDraft};

use super::session::{confirm, resolve, resolve_universe, short, CmdResult, Session, Settings};

/// Attributes for `starvault add`.
#[derive(Debug, Clone)]
pub struct AddArgs {
    pub name: String,
    pub category: String,
    pub inside: Option<String>,
    pub x: f64,
    pub y: f64,
    pub size: Option<f64>,
    pub color: Option<String>,
}

pub async fn run_add(settings: &Settings, args: AddArgs) -> CmdResult {
    let session = Session::open(settings, false).await?;
    let mut cosmos = session.load().await?;
    let at = resolve_universe(&cosmos, args.inside.as_deref())?;

    let mut draft = NodeDraft::new(args.name, Category::from(args.category)).at(args.x, args.y);
    if let Some(size) = args.size {
        draft = draft.size(size);
    }
    if let Some(color) = args.color {
        draft = draft.color(color);
    }
    let name = draft.name.clone();
    let id = cosmos
        .add_node(&at, draft)
        .ok_or("Target universe does not exist")?;

    session.commit(&cosmos).await?;
    session
        .engine
        .record(ACTION_ADD, json!({ "id": id.as_str(), "name": name }))
        .await;
    println!("Added {name} ({id})");
    Ok(())
}

pub async fn run_link(settings: &Settings, a: &str, b: &str) -> CmdResult {
    let session = Session::open(settings, false).await?;
    let mut cosmos = session.load().await?;
    let a = resolve(&cosmos, a)?;
    let b = resolve(&cosmos, b)?;

    let at = cosmos
        .location(&a)
        .ok_or("Nodes in the black hole cannot be linked")?;
    if cosmos.location(&b).as_ref() != Some(&at) {
        return Err("Links join nodes of the same universe; use `wormhole` instead".into());
    }
    if !cosmos.add_link(&at, &a, &b) {
        println!("Nothing to do: already linked, or a node linked to itself.");
        return Ok(());
    }

    session.commit(&cosmos).await?;
    println!("Linked {} <-> {}", short(&a), short(&b));
    Ok(())
}

pub async fn run_wormhole(settings: &Settings, a: &str, b: &str, remove: bool) -> CmdResult {
    let session = Session::open(settings, false).await?;
    let mut cosmos = session.load().await?;
    let a = resolve(&cosmos, a)?;
    let b = resolve(&cosmos, b)?;

    let changed = if remove {
        cosmos.remove_wormhole(&a, &b)
    } else {
        cosmos.add_wormhole(&a, &b)
    };
    if !changed {
        println!("Nothing to do.");
        return Ok(());
    }

    session.commit(&cosmos).await?;
    let verb = if remove { "Closed" } else { "Opened" };
    println!("{verb} wormhole {} <=> {}", short(&a), short(&b));
    Ok(())
}

pub async fn run_note(settings: &Settings, query: &str, text: &str) -> CmdResult {
    let session = Session::open(settings, false).await?;
    let mut cosmos = session.load().await?;
    let id = resolve(&cosmos, query)?;

    if let Some(node) = cosmos.node_mut(&id) {
        node.note = text.to_string();
    }
    session.commit(&cosmos).await?;
    session
        .engine
        .record(ACTION_NOTE, json!({ "id": id.as_str(), "length": text.chars().count() }))
        .await;
    println!("Note saved on {}", short(&id));
    Ok(())
}

pub async fn run_banish(settings: &Settings, query: &str) -> CmdResult {
    let session = Session::open(settings, false).await?;
    let mut cosmos = session.load().await?;
    let id = resolve(&cosmos, query)?;

    if !cosmos.banish(&id) {
        return Err(format!("{} is already in the black hole", short(&id)).into());
    }
    session.commit(&cosmos).await?;
    session
        .engine
        .record(ACTION_BANISH, json!({ "id": id.as_str() }))
        .await;
    println!("Sent {} to the black hole", short(&id));
    Ok(())
}

pub async fn run_recall(settings: &Settings, query: &str, into: Option<&str>) -> CmdResult {
    let session = Session::open(settings, false).await?;
    let mut cosmos = session.load().await?;
    let id = resolve(&cosmos, query)?;
    let at = resolve_universe(&cosmos, into)?;

    if !cosmos.recall(&id, &at) {
        return Err("Only black hole entries can be recalled, and never into themselves".into());
    }
    session.commit(&cosmos).await?;
    println!("Recalled {}", short(&id));
    Ok(())
}

pub async fn run_purge(settings: &Settings, query: &str, yes: bool) -> CmdResult {
    let session = Session::open(settings, false).await?;
    let mut cosmos = session.load().await?;
    let id = resolve(&cosmos, query)?;

    if !cosmos.black_hole().contains(&id) {
        return Err("Only black hole entries can be purged; banish it first".into());
    }
    let doomed = cosmos.subtree(&id).len();
    if !yes && !confirm(&format!("Destroy {} and {} nested node(s) forever?", short(&id), doomed - 1))? {
        println!("Aborted.");
        return Ok(());
    }

    cosmos.purge(&id);
    session.commit(&cosmos).await?;
    session
        .engine
        .record(ACTION_PURGE, json!({ "id": id.as_str(), "nodes": doomed }))
        .await;
    println!("Purged {doomed} node(s)");
    Ok(())
}
