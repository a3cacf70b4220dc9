//! The in-memory graph: universes of entity nodes, each node owning a nested
//! universe, plus cross-branch wormholes and the black hole holding pen.
//!
//! Nodes live in a single arena keyed by [`NodeId`]; universes list member
//! ids, and links/wormholes are id pairs. There are no live reference
//! cycles, so a document of any depth is dropped without recursion.

pub mod node;
pub mod universe;
pub mod cosmos;

pub use cosmos::{Cosmos, UniverseRef};
pub use node::{Category, EntityNode, Home, NodeDraft, NodeId, Theme};
pub use universe::{Link, Pair, Particle, Universe, Wormhole};
