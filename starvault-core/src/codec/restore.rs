use std::mem;

use tracing::warn;

use super::transport::{TransportDoc, TransportNode, TransportPair, TransportUniverse};
use crate::error::{Result, StarVaultError};
use crate::model::{Cosmos, EntityNode, Home, NodeDraft, NodeId, Universe, UniverseRef};

/// What a restore had to discard or repair to produce a consistent graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Links whose ends are not both members of the declaring universe,
    /// plus self links and repeats.
    pub dropped_links: usize,
    /// Wormholes naming an id absent from the document, plus self pairs
    /// and repeats.
    pub dropped_wormholes: usize,
    /// Nodes skipped (with their subtrees) because their id was already
    /// taken earlier in the document.
    pub duplicate_ids: usize,
    /// Nodes that arrived without an id and were given a fresh one.
    pub minted_ids: usize,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// A universe whose member nodes still need to be materialized.
struct Pending {
    at: UniverseRef,
    home: Home,
    nodes: Vec<TransportNode>,
    links: Vec<TransportPair>,
}

/// Rebuild the in-memory graph from its transport form.
///
/// Pass one materializes every node (under its recorded id) and then each
/// universe's links, once all of that universe's members exist. Pass two
/// resolves wormholes against the complete id index. Work is driven off an
/// explicit stack, so arbitrarily deep documents are fine.
pub fn restore(mut doc: TransportDoc) -> Result<(Cosmos, RestoreReport)> {
    let name = doc
        .root
        .name
        .take()
        .ok_or_else(|| StarVaultError::Malformed("root universe has no name".to_string()))?;
    let root_nodes = doc
        .root
        .nodes
        .take()
        .ok_or_else(|| StarVaultError::Malformed("root universe has no node list".to_string()))?;

    let mut cosmos = Cosmos::with_root(Universe::new(name, doc.root.theme.clone()));
    let mut report = RestoreReport::default();

    // Root tree first, then the black hole, so the first occurrence of a
    // duplicated id in document order is the one kept.
    build_universes(
        &mut cosmos,
        &mut report,
        vec![Pending {
            at: UniverseRef::Root,
            home: Home::Root,
            nodes: root_nodes,
            links: mem::take(&mut doc.root.links),
        }],
    );

    let mut banished = Vec::new();
    for node in mem::take(&mut doc.black_hole) {
        if let Some((id, child)) = materialize(&mut cosmos, &mut report, node, Home::BlackHole) {
            cosmos.black_hole.push(id);
            banished.push(child);
        }
    }
    banished.reverse();
    build_universes(&mut cosmos, &mut report, banished);

    for pair in &doc.wormholes {
        let (a, b) = (NodeId::from(pair.source.as_str()), NodeId::from(pair.target.as_str()));
        if !cosmos.add_wormhole(&a, &b) {
            warn!(source = %a, target = %b, "dropping unresolvable wormhole");
            report.dropped_wormholes += 1;
        }
    }

    Ok((cosmos, report))
}

/// Materialize every pending universe and, below it, its whole subtree.
fn build_universes(cosmos: &mut Cosmos, report: &mut RestoreReport, mut stack: Vec<Pending>) {
    while let Some(pending) = stack.pop() {
        let mut children = Vec::with_capacity(pending.nodes.len());
        for node in pending.nodes {
            if let Some((id, child)) = materialize(cosmos, report, node, pending.home.clone()) {
                if let Some(universe) = cosmos.universe_mut(&pending.at) {
                    universe.attach(id);
                }
                children.push(child);
            }
        }

        if let Some(universe) = cosmos.universe_mut(&pending.at) {
            for link in &pending.links {
                let (a, b) = (NodeId::from(link.source.as_str()), NodeId::from(link.target.as_str()));
                if !universe.add_link(&a, &b) {
                    warn!(source = %a, target = %b, universe = %universe.name, "dropping unresolvable link");
                    report.dropped_links += 1;
                }
            }
        }

        stack.extend(children.into_iter().rev());
    }
}

/// Insert one node into the arena and hand back the work item for its
/// interior. `None` when the id is already taken.
fn materialize(
    cosmos: &mut Cosmos,
    report: &mut RestoreReport,
    mut node: TransportNode,
    home: Home,
) -> Option<(NodeId, Pending)> {
    let id = match node.id.take().filter(|id| !id.is_empty()) {
        Some(id) => NodeId::from(id),
        None => {
            report.minted_ids += 1;
            NodeId::generate()
        }
    };
    if cosmos.contains(&id) {
        warn!(id = %id, "skipping node with duplicate id");
        report.duplicate_ids += 1;
        return None;
    }

    // An interior that was never written takes its theme from the category.
    let (mut inner_doc, theme) = match node.inner_universe.take() {
        Some(written) => {
            let theme = written.theme.clone();
            (written, theme)
        }
        None => (TransportUniverse::default(), node.category.inner_theme()),
    };
    let inner = Universe::new(
        inner_doc
            .name
            .take()
            .unwrap_or_else(|| format!("{} interior", node.name)),
        theme,
    );

    let draft = NodeDraft::new(mem::take(&mut node.name), node.category.clone())
        .at(node.base_x, node.base_y)
        .size(node.size)
        .color(mem::take(&mut node.color));
    let mut entity = EntityNode::with_id(id.clone(), draft, home, inner);
    entity.url = mem::take(&mut node.url);
    entity.icon_url = mem::take(&mut node.icon_url);
    entity.is_locked = node.is_locked;
    entity.password = node.password.take();
    entity.owner_id = node.owner_id.take();
    entity.note = mem::take(&mut node.note);
    cosmos.nodes.insert(id.clone(), entity);

    let pending = Pending {
        at: UniverseRef::Inner(id.clone()),
        home: Home::Inner(id.clone()),
        nodes: inner_doc.nodes.take().unwrap_or_default(),
        links: mem::take(&mut inner_doc.links),
    };
    Some((id, pending))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::flatten;
    use crate::model::{Category, Theme};

    fn parse(json: &str) -> TransportDoc {
        crate::codec::json::read_doc(json.as_bytes()).unwrap()
    }

    #[test]
    fn test_restore_keeps_ids_and_nesting() {
        let mut original = Cosmos::genesis("Home");
        let ideas = original.root().node_ids()[0].clone();
        let inner = original
            .add_node(
                &UniverseRef::Inner(ideas.clone()),
                NodeDraft::new("Cell", Category::Life),
            )
            .unwrap();
        original.node_mut(&inner).unwrap().note = "remember".to_string();

        let (restored, report) = restore(flatten(&original)).unwrap();
        assert!(report.is_clean());
        assert_eq!(restored, original);
        assert_eq!(restored.location(&inner), Some(UniverseRef::Inner(ideas)));
        assert_eq!(restored.node(&inner).unwrap().inner().theme(), &Theme::Cell);
    }

    #[test]
    fn test_link_to_later_sibling_resolves() {
        let doc = parse(
            r#"{"root":{"name":"A","nodes":[{"id":"a"},{"id":"b"}],
                "links":[{"sourceId":"a","targetId":"b"}]}}"#,
        );
        let (cosmos, report) = restore(doc).unwrap();
        assert_eq!(cosmos.root().links().len(), 1);
        assert!(report.is_clean());
    }

    #[test]
    fn test_dangling_references_are_dropped() {
        let doc = parse(
            r#"{"root":{"name":"A","nodes":[{"id":"a"},{"id":"b","innerUniverse":
                {"name":"in","nodes":[{"id":"c"}],"links":[{"sourceId":"c","targetId":"a"}]}}],
                "links":[{"sourceId":"a","targetId":"ghost"}]},
               "wormholes":[{"sourceId":"a","targetId":"c"},{"sourceId":"a","targetId":"nope"}]}"#,
        );
        let (cosmos, report) = restore(doc).unwrap();
        assert_eq!(report.dropped_links, 2);
        assert_eq!(report.dropped_wormholes, 1);
        assert_eq!(cosmos.wormholes().len(), 1);
        assert_eq!(cosmos.len(), 3);
    }

    #[test]
    fn test_duplicate_id_keeps_first() {
        let doc = parse(
            r#"{"root":{"name":"A","nodes":[{"id":"a","name":"first"},{"id":"a","name":"second"}]}}"#,
        );
        let (cosmos, report) = restore(doc).unwrap();
        assert_eq!(report.duplicate_ids, 1);
        assert_eq!(cosmos.node(&NodeId::from("a")).unwrap().name, "first");
        assert_eq!(cosmos.root().len(), 1);
    }

    #[test]
    fn test_missing_pieces_get_defaults() {
        let doc = parse(r#"{"root":{"name":"A","nodes":[{"name":"Amoeba","category":"microbe"}]}}"#);
        let (cosmos, report) = restore(doc).unwrap();
        assert_eq!(report.minted_ids, 1);
        let node = cosmos.members(&UniverseRef::Root)[0];
        assert_eq!(node.inner().name, "Amoeba interior");
        assert_eq!(node.inner().theme(), &Theme::Cell);
        assert!(cosmos.wormholes().is_empty());
    }

    #[test]
    fn test_black_hole_entries_restore_with_home() {
        let doc = parse(
            r#"{"root":{"name":"A","nodes":[]},
               "blackHole":[{"id":"lost","innerUniverse":{"name":"x","nodes":[{"id":"kid"}]}}],
               "wormholes":[{"sourceId":"lost","targetId":"kid"}]}"#,
        );
        let (cosmos, _) = restore(doc).unwrap();
        let lost = NodeId::from("lost");
        assert_eq!(cosmos.black_hole(), &[lost.clone()]);
        assert_eq!(cosmos.node(&lost).unwrap().home(), &Home::BlackHole);
        assert_eq!(
            cosmos.location(&NodeId::from("kid")),
            Some(UniverseRef::Inner(lost))
        );
        assert_eq!(cosmos.wormholes().len(), 1);
    }

    #[test]
    fn test_root_copy_of_an_id_wins_over_black_hole_copy() {
        let doc = parse(
            r#"{"root":{"name":"A","nodes":[{"id":"twin","name":"kept"}]},
               "blackHole":[{"id":"twin","name":"dropped"},{"id":"other"}]}"#,
        );
        let (cosmos, report) = restore(doc).unwrap();
        let twin = NodeId::from("twin");
        assert_eq!(report.duplicate_ids, 1);
        assert_eq!(cosmos.node(&twin).unwrap().name, "kept");
        assert_eq!(cosmos.location(&twin), Some(UniverseRef::Root));
        assert_eq!(cosmos.black_hole(), &[NodeId::from("other")]);
    }

    #[test]
    fn test_missing_skeleton_is_malformed() {
        let doc = parse(r#"{"root":{"nodes":[]}}"#);
        assert!(matches!(restore(doc), Err(StarVaultError::Malformed(_))));
        let doc = parse(r#"{"root":{"name":"A"}}"#);
        assert!(matches!(restore(doc), Err(StarVaultError::Malformed(_))));
    }
}
