use rand::Rng;

use super::node::{NodeId, Theme};
use crate::constants::PARTICLES_PER_UNIVERSE;

/// An undirected pair of node ids. `source`/`target` keep the order the pair
/// was created in, but two pairs with swapped ends are the same relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub source: NodeId,
    pub target: NodeId,
}

impl Pair {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self { source, target }
    }

    pub fn connects(&self, a: &NodeId, b: &NodeId) -> bool {
        (&self.source == a && &self.target == b) || (&self.source == b && &self.target == a)
    }

    pub fn touches(&self, id: &NodeId) -> bool {
        &self.source == id || &self.target == id
    }

    /// The end opposite `id`, if `id` is one of the ends.
    pub fn other_end(&self, id: &NodeId) -> Option<&NodeId> {
        if &self.source == id {
            Some(&self.target)
        } else if &self.target == id {
            Some(&self.source)
        } else {
            None
        }
    }
}

/// Edge between two siblings of the same universe.
pub type Link = Pair;

/// Edge between two nodes anywhere in the document.
pub type Wormhole = Pair;

/// Decorative background dot. Regenerated on construction, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub speed: f32,
}

fn scatter_particles(count: usize) -> Vec<Particle> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| Particle {
            x: rng.gen_range(-2000.0..2000.0),
            y: rng.gen_range(-2000.0..2000.0),
            size: rng.gen_range(0.5..2.5),
            speed: rng.gen_range(0.1..0.6),
        })
        .collect()
}

/// A named, themed scope holding an ordered set of member node ids and the
/// links among them.
#[derive(Debug, Clone)]
pub struct Universe {
    pub name: String,
    theme: Theme,
    nodes: Vec<NodeId>,
    links: Vec<Link>,
    particles: Vec<Particle>,
}

impl Universe {
    pub fn new(name: impl Into<String>, theme: Theme) -> Self {
        Self {
            name: name.into(),
            theme,
            nodes: Vec::new(),
            links: Vec::new(),
            particles: scatter_particles(PARTICLES_PER_UNIVERSE),
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn node_ids(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn regenerate_particles(&mut self) {
        self.particles = scatter_particles(PARTICLES_PER_UNIVERSE);
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a member id. Returns `false` (and changes nothing) if present.
    pub(crate) fn attach(&mut self, id: NodeId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.nodes.push(id);
        true
    }

    /// Link two members. No-op when `a == b`, when either is not a member,
    /// or when the pair already exists in either direction.
    pub fn add_link(&mut self, a: &NodeId, b: &NodeId) -> bool {
        if a == b || !self.contains(a) || !self.contains(b) {
            return false;
        }
        if self.links.iter().any(|l| l.connects(a, b)) {
            return false;
        }
        self.links.push(Link::new(a.clone(), b.clone()));
        true
    }

    /// Drop a member and every link naming it. Wormholes and the member's
    /// own subtree are left to the caller.
    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n != id);
        if self.nodes.len() == before {
            return false;
        }
        self.links.retain(|l| !l.touches(id));
        true
    }
}

// Particles are decoration and excluded from equality.
impl PartialEq for Universe {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.theme == other.theme
            && self.nodes == other.nodes
            && self.links == other.links
    }
}
