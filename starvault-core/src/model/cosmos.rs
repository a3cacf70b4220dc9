use std::collections::{HashMap, HashSet};

use super::node::{Category, EntityNode, Home, NodeDraft, NodeId, Theme};
use super::universe::{Universe, Wormhole};

/// Addresses a universe: the document root, or the interior of a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UniverseRef {
    Root,
    Inner(NodeId),
}

impl UniverseRef {
    /// The universe a node with this home sits in; `None` for the black hole.
    pub fn of(home: &Home) -> Option<Self> {
        match home {
            Home::Root => Some(UniverseRef::Root),
            Home::Inner(owner) => Some(UniverseRef::Inner(owner.clone())),
            Home::BlackHole => None,
        }
    }
}

/// One complete document: the root universe, every node in the forest,
/// wormholes and the black hole.
///
/// The node arena doubles as the global id index: every node reachable from
/// the root or the black hole is in it, and nothing else is.
#[derive(Debug, Clone, PartialEq)]
pub struct Cosmos {
    pub(crate) root: Universe,
    pub(crate) nodes: HashMap<NodeId, EntityNode>,
    pub(crate) wormholes: Vec<Wormhole>,
    pub(crate) black_hole: Vec<NodeId>,
}

impl Cosmos {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_root(Universe::new(name, Theme::Space))
    }

    pub(crate) fn with_root(root: Universe) -> Self {
        Self {
            root,
            nodes: HashMap::new(),
            wormholes: Vec::new(),
            black_hole: Vec::new(),
        }
    }

    /// The starter document shown on first run.
    pub fn genesis(name: impl Into<String>) -> Self {
        let mut cosmos = Self::new(name);
        let ideas = cosmos.add_node(
            &UniverseRef::Root,
            NodeDraft::new("Ideas", Category::Galaxy)
                .at(-150.0, -50.0)
                .size(30.0)
                .color("#9966ff"),
        );
        let system = cosmos.add_node(
            &UniverseRef::Root,
            NodeDraft::new("System", Category::Star)
                .at(100.0, -100.0)
                .size(18.0)
                .color("#ffcc00"),
        );
        if let (Some(a), Some(b)) = (ideas, system) {
            cosmos.add_link(&UniverseRef::Root, &a, &b);
        }
        cosmos
    }

    pub fn root(&self) -> &Universe {
        &self.root
    }

    pub fn universe(&self, at: &UniverseRef) -> Option<&Universe> {
        match at {
            UniverseRef::Root => Some(&self.root),
            UniverseRef::Inner(owner) => self.nodes.get(owner).map(|n| &n.inner),
        }
    }

    pub(crate) fn universe_mut(&mut self, at: &UniverseRef) -> Option<&mut Universe> {
        match at {
            UniverseRef::Root => Some(&mut self.root),
            UniverseRef::Inner(owner) => self.nodes.get_mut(owner).map(|n| &mut n.inner),
        }
    }

    pub fn rename_universe(&mut self, at: &UniverseRef, name: impl Into<String>) -> bool {
        match self.universe_mut(at) {
            Some(u) => {
                u.name = name.into();
                true
            }
            None => false,
        }
    }

    pub fn node(&self, id: &NodeId) -> Option<&EntityNode> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Option<&mut EntityNode> {
        self.nodes.get_mut(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Members of a universe in display order.
    pub fn members(&self, at: &UniverseRef) -> Vec<&EntityNode> {
        self.universe(at)
            .map(|u| u.node_ids().iter().filter_map(|id| self.nodes.get(id)).collect())
            .unwrap_or_default()
    }

    pub fn wormholes(&self) -> &[Wormhole] {
        &self.wormholes
    }

    pub fn black_hole(&self) -> &[NodeId] {
        &self.black_hole
    }

    /// Total node count across the root tree and the black hole.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Universe currently containing `id`; `None` for black hole entries.
    pub fn location(&self, id: &NodeId) -> Option<UniverseRef> {
        self.nodes.get(id).and_then(|n| UniverseRef::of(&n.home))
    }

    /// Create a node inside `at`. Returns `None` when `at` does not exist.
    pub fn add_node(&mut self, at: &UniverseRef, draft: NodeDraft) -> Option<NodeId> {
        let home = match at {
            UniverseRef::Root => Home::Root,
            UniverseRef::Inner(owner) if self.nodes.contains_key(owner) => {
                Home::Inner(owner.clone())
            }
            UniverseRef::Inner(_) => return None,
        };

        let node = EntityNode::from_draft(draft, home);
        let id = node.id().clone();
        self.universe_mut(at)?.attach(id.clone());
        self.nodes.insert(id.clone(), node);
        Some(id)
    }

    pub fn add_link(&mut self, at: &UniverseRef, a: &NodeId, b: &NodeId) -> bool {
        self.universe_mut(at).is_some_and(|u| u.add_link(a, b))
    }

    /// Connect two nodes anywhere in the document. No-op on a self pair,
    /// an unknown id, or an existing pair in either direction.
    pub fn add_wormhole(&mut self, a: &NodeId, b: &NodeId) -> bool {
        if a == b || !self.contains(a) || !self.contains(b) {
            return false;
        }
        if self.wormholes.iter().any(|w| w.connects(a, b)) {
            return false;
        }
        self.wormholes.push(Wormhole::new(a.clone(), b.clone()));
        true
    }

    pub fn remove_wormhole(&mut self, a: &NodeId, b: &NodeId) -> bool {
        let before = self.wormholes.len();
        self.wormholes.retain(|w| !w.connects(a, b));
        self.wormholes.len() != before
    }

    /// Wormholes with `id` as one end.
    pub fn wormholes_of(&self, id: &NodeId) -> Vec<&Wormhole> {
        self.wormholes.iter().filter(|w| w.touches(id)).collect()
    }

    /// Move a node out of its universe into the black hole. Its subtree and
    /// wormholes survive; its sibling links do not.
    pub fn banish(&mut self, id: &NodeId) -> bool {
        let Some(at) = self.location(id) else {
            return false;
        };
        if !self.universe_mut(&at).is_some_and(|u| u.remove_node(id)) {
            return false;
        }
        self.black_hole.push(id.clone());
        if let Some(node) = self.nodes.get_mut(id) {
            node.home = Home::BlackHole;
        }
        true
    }

    /// Bring a black hole entry back into `at`. Refused when `at` lies inside
    /// the entry's own subtree.
    pub fn recall(&mut self, id: &NodeId, at: &UniverseRef) -> bool {
        let Some(pos) = self.black_hole.iter().position(|b| b == id) else {
            return false;
        };
        let home = match at {
            UniverseRef::Root => Home::Root,
            UniverseRef::Inner(owner) => {
                if !self.contains(owner) || owner == id || self.ancestors(owner).contains(id) {
                    return false;
                }
                Home::Inner(owner.clone())
            }
        };

        if !self.universe_mut(at).is_some_and(|u| u.attach(id.clone())) {
            return false;
        }
        self.black_hole.remove(pos);
        if let Some(node) = self.nodes.get_mut(id) {
            node.home = home;
        }
        true
    }

    /// Irreversibly destroy a black hole entry and its whole subtree, along
    /// with every wormhole touching a destroyed node.
    pub fn purge(&mut self, id: &NodeId) -> bool {
        let Some(pos) = self.black_hole.iter().position(|b| b == id) else {
            return false;
        };
        self.black_hole.remove(pos);

        let doomed: HashSet<NodeId> = self.subtree(id).into_iter().collect();
        for d in &doomed {
            self.nodes.remove(d);
        }
        self.wormholes
            .retain(|w| !doomed.contains(&w.source) && !doomed.contains(&w.target));
        true
    }

    /// `id` followed by every node nested below it, pre-order.
    pub fn subtree(&self, id: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            stack.extend(node.inner.node_ids().iter().rev().cloned());
            out.push(current);
        }
        out
    }

    /// Owners from the nearest enclosing node outward.
    pub fn ancestors(&self, id: &NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = id;
        while let Some(Home::Inner(owner)) = self.nodes.get(current).map(|n| &n.home) {
            if out.len() > self.nodes.len() {
                break;
            }
            out.push(owner.clone());
            current = owner;
        }
        out
    }

    /// Nesting depth of a node: 0 for members of the root universe or of
    /// the black hole list itself.
    pub fn depth_of(&self, id: &NodeId) -> Option<usize> {
        self.contains(id).then(|| self.ancestors(id).len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn star(name: &str) -> NodeDraft {
        NodeDraft::new(name, Category::Star)
    }

    #[test]
    fn test_add_node_attaches_to_universe() {
        let mut c = Cosmos::new("A");
        let n1 = c.add_node(&UniverseRef::Root, star("n1")).unwrap();
        let n2 = c.add_node(&UniverseRef::Inner(n1.clone()), star("n2")).unwrap();

        assert_eq!(c.root().node_ids(), &[n1.clone()]);
        assert_eq!(c.node(&n1).unwrap().inner().node_ids(), &[n2.clone()]);
        assert_eq!(c.node(&n2).unwrap().home(), &Home::Inner(n1.clone()));
        assert_eq!(c.location(&n2), Some(UniverseRef::Inner(n1)));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_add_node_into_unknown_universe_is_noop() {
        let mut c = Cosmos::new("A");
        let result = c.add_node(&UniverseRef::Inner(NodeId::from("ghost")), star("x"));
        assert!(result.is_none());
        assert!(c.is_empty());
    }

    #[test]
    fn test_genesis_document() {
        let c = Cosmos::genesis("My Universe");
        assert_eq!(c.root().name, "My Universe");
        assert_eq!(c.root().len(), 2);
        assert_eq!(c.root().links().len(), 1);
        let names: Vec<_> = c.members(&UniverseRef::Root).iter().map(|n| n.name.clone()).collect();
        assert_eq!(names, vec!["Ideas", "System"]);
    }

    #[test]
    fn test_wormhole_rules() {
        let mut c = Cosmos::new("A");
        let a = c.add_node(&UniverseRef::Root, star("a")).unwrap();
        let b = c.add_node(&UniverseRef::Inner(a.clone()), star("b")).unwrap();

        assert!(c.add_wormhole(&a, &b));
        assert!(!c.add_wormhole(&b, &a));
        assert!(!c.add_wormhole(&a, &a));
        assert!(!c.add_wormhole(&a, &NodeId::from("ghost")));
        assert_eq!(c.wormholes().len(), 1);
        assert_eq!(c.wormholes_of(&b).len(), 1);

        assert!(c.remove_wormhole(&b, &a));
        assert!(c.wormholes().is_empty());
    }

    #[test]
    fn test_banish_keeps_subtree_and_wormholes() {
        let mut c = Cosmos::new("A");
        let a = c.add_node(&UniverseRef::Root, star("a")).unwrap();
        let b = c.add_node(&UniverseRef::Root, star("b")).unwrap();
        let child = c.add_node(&UniverseRef::Inner(a.clone()), star("child")).unwrap();
        c.add_link(&UniverseRef::Root, &a, &b);
        c.add_wormhole(&child, &b);

        assert!(c.banish(&a));
        assert_eq!(c.root().node_ids(), &[b.clone()]);
        assert!(c.root().links().is_empty());
        assert_eq!(c.black_hole(), &[a.clone()]);
        assert_eq!(c.node(&a).unwrap().home(), &Home::BlackHole);
        assert!(c.contains(&child));
        assert_eq!(c.wormholes().len(), 1);
        assert!(!c.banish(&a), "already in the black hole");
    }

    #[test]
    fn test_recall_into_universe() {
        let mut c = Cosmos::new("A");
        let a = c.add_node(&UniverseRef::Root, star("a")).unwrap();
        let b = c.add_node(&UniverseRef::Root, star("b")).unwrap();
        c.banish(&a);

        assert!(c.recall(&a, &UniverseRef::Inner(b.clone())));
        assert!(c.black_hole().is_empty());
        assert_eq!(c.location(&a), Some(UniverseRef::Inner(b.clone())));
        assert_eq!(c.depth_of(&a), Some(1));
    }

    #[test]
    fn test_recall_into_own_subtree_refused() {
        let mut c = Cosmos::new("A");
        let a = c.add_node(&UniverseRef::Root, star("a")).unwrap();
        let inner = c.add_node(&UniverseRef::Inner(a.clone()), star("inner")).unwrap();
        c.banish(&a);

        assert!(!c.recall(&a, &UniverseRef::Inner(a.clone())));
        assert!(!c.recall(&a, &UniverseRef::Inner(inner)));
        assert_eq!(c.black_hole(), &[a]);
    }

    #[test]
    fn test_purge_destroys_subtree_and_wormholes() {
        let mut c = Cosmos::new("A");
        let keep = c.add_node(&UniverseRef::Root, star("keep")).unwrap();
        let doomed = c.add_node(&UniverseRef::Root, star("doomed")).unwrap();
        let deep = c.add_node(&UniverseRef::Inner(doomed.clone()), star("deep")).unwrap();
        c.add_wormhole(&keep, &deep);

        assert!(!c.purge(&doomed), "only black hole entries can be purged");
        c.banish(&doomed);
        assert!(c.purge(&doomed));

        assert!(!c.contains(&doomed));
        assert!(!c.contains(&deep));
        assert!(c.wormholes().is_empty());
        assert!(c.black_hole().is_empty());
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_subtree_and_ancestors() {
        let mut c = Cosmos::new("A");
        let a = c.add_node(&UniverseRef::Root, star("a")).unwrap();
        let b = c.add_node(&UniverseRef::Inner(a.clone()), star("b")).unwrap();
        let d = c.add_node(&UniverseRef::Inner(b.clone()), star("d")).unwrap();
        let e = c.add_node(&UniverseRef::Inner(a.clone()), star("e")).unwrap();

        assert_eq!(c.subtree(&a), vec![a.clone(), b.clone(), d.clone(), e.clone()]);
        assert_eq!(c.ancestors(&d), vec![b.clone(), a.clone()]);
        assert_eq!(c.depth_of(&d), Some(2));
        assert_eq!(c.depth_of(&NodeId::from("ghost")), None);
    }

    #[test]
    fn test_deep_nesting_does_not_recurse() {
        let mut c = Cosmos::new("deep");
        let mut at = UniverseRef::Root;
        let mut last = None;
        for i in 0..5_000 {
            let id = c.add_node(&at, star(&format!("n{i}"))).unwrap();
            at = UniverseRef::Inner(id.clone());
            last = Some(id);
        }
        let last = last.unwrap();
        assert_eq!(c.depth_of(&last), Some(4_999));
        drop(c);
    }
}
