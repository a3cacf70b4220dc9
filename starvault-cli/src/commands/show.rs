use std::fmt::Write;

use starvault_core::model::{Cosmos, NodeId, UniverseRef};

use super::session::{resolve_universe, short, CmdResult, Session, Settings};

/// Print a universe as an indented tree, followed by links, wormholes and
/// the black hole.
pub async fn run_show(settings: &Settings, inside: Option<&str>) -> CmdResult {
    let session = Session::open(settings, false).await?;
    let cosmos = session.load().await?;
    let at = resolve_universe(&cosmos, inside)?;
    print!("{}", render(&cosmos, &at));
    Ok(())
}

pub fn render(cosmos: &Cosmos, at: &UniverseRef) -> String {
    let mut out = String::new();
    let Some(universe) = cosmos.universe(at) else {
        return out;
    };
    let _ = writeln!(out, "{} [{}]", universe.name, universe.theme());

    let mut stack: Vec<(NodeId, usize)> =
        universe.node_ids().iter().rev().map(|id| (id.clone(), 1)).collect();
    let mut links = Vec::new();
    collect_links(cosmos, at, &mut links);

    while let Some((id, depth)) = stack.pop() {
        let Some(node) = cosmos.node(&id) else {
            continue;
        };
        let _ = write!(
            out,
            "{:indent$}- {} ({}) {}",
            "",
            node.name,
            node.category,
            short(&id),
            indent = depth * 2
        );
        if node.is_locked {
            out.push_str(" [locked]");
        }
        if !node.note.is_empty() {
            let _ = write!(out, " \"{}\"", node.note);
        }
        out.push('\n');

        collect_links(cosmos, &UniverseRef::Inner(id.clone()), &mut links);
        stack.extend(node.inner().node_ids().iter().rev().map(|c| (c.clone(), depth + 1)));
    }

    if !links.is_empty() {
        out.push_str("\nLinks:\n");
        for line in &links {
            let _ = writeln!(out, "  {line}");
        }
    }
    if !cosmos.wormholes().is_empty() {
        out.push_str("\nWormholes:\n");
        for w in cosmos.wormholes() {
            let _ = writeln!(out, "  {} <=> {}", label(cosmos, &w.source), label(cosmos, &w.target));
        }
    }
    if !cosmos.black_hole().is_empty() {
        out.push_str("\nBlack hole:\n");
        for id in cosmos.black_hole() {
            let _ = writeln!(out, "  {}", label(cosmos, id));
        }
    }
    out
}

fn collect_links(cosmos: &Cosmos, at: &UniverseRef, out: &mut Vec<String>) {
    let Some(universe) = cosmos.universe(at) else {
        return;
    };
    for link in universe.links() {
        out.push(format!(
            "{}: {} <-> {}",
            universe.name,
            label(cosmos, &link.source),
            label(cosmos, &link.target)
        ));
    }
}

fn label(cosmos: &Cosmos, id: &NodeId) -> String {
    match cosmos.node(id) {
        Some(node) => format!("{} ({})", node.name, short(id)),
        None => short(id).to_string(),
    }
}
