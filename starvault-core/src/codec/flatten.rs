use std::collections::HashMap;

use super::transport::{TransportDoc, TransportNode, TransportPair, TransportUniverse};
use crate::constants::TRANSPORT_VERSION;
use crate::model::{Cosmos, EntityNode, NodeId, Pair, Universe};

/// Convert the in-memory graph to its transport form.
///
/// Children are built before their owners by walking each pre-order
/// subtree listing backwards, so no call recurses per nesting level.
pub fn flatten(cosmos: &Cosmos) -> TransportDoc {
    let root = {
        let mut built = build_subtrees(cosmos, cosmos.root().node_ids());
        transport_universe(cosmos.root(), &mut built)
    };

    let black_hole = {
        let mut built = build_subtrees(cosmos, cosmos.black_hole());
        cosmos
            .black_hole()
            .iter()
            .filter_map(|id| built.remove(id))
            .collect()
    };

    TransportDoc {
        version: TRANSPORT_VERSION,
        root,
        wormholes: cosmos.wormholes().iter().map(transport_pair).collect(),
        black_hole,
    }
}

fn build_subtrees(cosmos: &Cosmos, tops: &[NodeId]) -> HashMap<NodeId, TransportNode> {
    let order: Vec<NodeId> = tops.iter().flat_map(|id| cosmos.subtree(id)).collect();
    let mut built = HashMap::with_capacity(order.len());
    for id in order.iter().rev() {
        let Some(node) = cosmos.node(id) else {
            continue;
        };
        let inner = transport_universe(node.inner(), &mut built);
        built.insert(id.clone(), transport_node(node, inner));
    }
    built
}

fn transport_universe(
    universe: &Universe,
    built: &mut HashMap<NodeId, TransportNode>,
) -> TransportUniverse {
    TransportUniverse {
        name: Some(universe.name.clone()),
        theme: universe.theme().clone(),
        nodes: Some(
            universe
                .node_ids()
                .iter()
                .filter_map(|id| built.remove(id))
                .collect(),
        ),
        links: universe.links().iter().map(transport_pair).collect(),
    }
}

fn transport_node(node: &EntityNode, inner: TransportUniverse) -> TransportNode {
    TransportNode {
        id: Some(node.id().to_string()),
        name: node.name.clone(),
        category: node.category.clone(),
        size: node.size,
        color: node.color.clone(),
        url: node.url.clone(),
        icon_url: node.icon_url.clone(),
        is_locked: node.is_locked,
        password: node.password.clone(),
        owner_id: node.owner_id.clone(),
        note: node.note.clone(),
        base_x: node.base_x,
        base_y: node.base_y,
        inner_universe: Some(inner),
    }
}

fn transport_pair(pair: &Pair) -> TransportPair {
    TransportPair {
        source: pair.source.to_string(),
        target: pair.target.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, NodeDraft, UniverseRef};

    #[test]
    fn test_flatten_nests_inner_universes() {
        let mut cosmos = Cosmos::new("Home");
        let sun = cosmos
            .add_node(&UniverseRef::Root, NodeDraft::new("Sun", Category::Star))
            .unwrap();
        let planet = cosmos
            .add_node(
                &UniverseRef::Inner(sun.clone()),
                NodeDraft::new("Planet", Category::Star),
            )
            .unwrap();

        let doc = flatten(&cosmos);
        let top = &doc.root.nodes.as_ref().unwrap()[0];
        assert_eq!(top.id.as_deref(), Some(sun.as_str()));
        let inner = top.inner_universe.as_ref().unwrap();
        assert_eq!(inner.name.as_deref(), Some("Sun interior"));
        assert_eq!(
            inner.nodes.as_ref().unwrap()[0].id.as_deref(),
            Some(planet.as_str())
        );
    }

    #[test]
    fn test_flatten_omits_animation_state() {
        let mut cosmos = Cosmos::new("Home");
        let sun = cosmos
            .add_node(
                &UniverseRef::Root,
                NodeDraft::new("Sun", Category::Star).at(10.0, 20.0),
            )
            .unwrap();
        cosmos.node_mut(&sun).unwrap().x = 999.0;

        let bytes = crate::codec::json::write_doc(&flatten(&cosmos)).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let node = &json["root"]["nodes"][0];
        assert_eq!(node["baseX"], 10.0);
        assert!(node.get("x").is_none());
        assert!(json["root"].get("particles").is_none());
    }

    #[test]
    fn test_flatten_keeps_black_hole_and_wormholes() {
        let mut cosmos = Cosmos::new("Home");
        let a = cosmos
            .add_node(&UniverseRef::Root, NodeDraft::new("A", Category::Star))
            .unwrap();
        let b = cosmos
            .add_node(&UniverseRef::Root, NodeDraft::new("B", Category::Star))
            .unwrap();
        cosmos.add_wormhole(&a, &b);
        cosmos.banish(&b);

        let doc = flatten(&cosmos);
        assert_eq!(doc.root.nodes.as_ref().unwrap().len(), 1);
        assert_eq!(doc.black_hole.len(), 1);
        assert_eq!(doc.wormholes.len(), 1);
    }
}
