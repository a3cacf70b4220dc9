use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::universe::Universe;

/// Opaque, globally unique node identifier. Never regenerated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Allocate a fresh 128-bit random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// What a node depicts. Only drives the visual theme; unknown kinds are
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    #[default]
    Star,
    Galaxy,
    Life,
    Microbe,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Star => "star",
            Category::Galaxy => "galaxy",
            Category::Life => "life",
            Category::Microbe => "microbe",
            Category::Other(s) => s,
        }
    }

    /// Theme of the universe nested inside a node of this category.
    pub fn inner_theme(&self) -> Theme {
        match self {
            Category::Life | Category::Microbe => Theme::Cell,
            _ => Theme::Space,
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.as_str() {
            "star" => Category::Star,
            "galaxy" => Category::Galaxy,
            "life" => Category::Life,
            "microbe" => Category::Microbe,
            _ => Category::Other(value),
        }
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Theme {
    #[default]
    Space,
    Cell,
    Other(String),
}

impl Theme {
    pub fn as_str(&self) -> &str {
        match self {
            Theme::Space => "space",
            Theme::Cell => "cell",
            Theme::Other(s) => s,
        }
    }
}

impl From<String> for Theme {
    fn from(value: String) -> Self {
        match value.as_str() {
            "space" => Theme::Space,
            "cell" => Theme::Cell,
            _ => Theme::Other(value),
        }
    }
}

impl From<Theme> for String {
    fn from(value: Theme) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a node currently lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Home {
    Root,
    Inner(NodeId),
    BlackHole,
}

/// Caller-supplied attributes of a node about to be created.
#[derive(Debug, Clone)]
pub struct NodeDraft {
    pub name: String,
    pub category: Category,
    pub size: f64,
    pub color: String,
    pub x: f64,
    pub y: f64,
}

impl NodeDraft {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            size: 25.0,
            color: "#ffffff".to_string(),
            x: 0.0,
            y: 0.0,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }
}

/// A graph vertex that owns exactly one nested universe.
#[derive(Debug, Clone)]
pub struct EntityNode {
    id: NodeId,
    pub name: String,
    pub category: Category,
    pub size: f64,
    pub color: String,
    pub url: String,
    pub icon_url: String,
    pub is_locked: bool,
    /// Secondary gate secret checked by the UI. Stored as entered.
    pub password: Option<String>,
    pub owner_id: Option<String>,
    pub note: String,
    /// Rest position; persisted.
    pub base_x: f64,
    pub base_y: f64,
    /// Animated position; never persisted.
    pub x: f64,
    pub y: f64,
    pub(crate) home: Home,
    pub(crate) inner: Universe,
}

impl EntityNode {
    pub(crate) fn from_draft(draft: NodeDraft, home: Home) -> Self {
        let inner = Universe::new(
            format!("{} interior", draft.name),
            draft.category.inner_theme(),
        );
        Self::with_id(NodeId::generate(), draft, home, inner)
    }

    /// Build a node under a caller-chosen id.
    pub(crate) fn with_id(id: NodeId, draft: NodeDraft, home: Home, inner: Universe) -> Self {
        Self {
            id,
            name: draft.name,
            category: draft.category,
            size: draft.size,
            color: draft.color,
            url: String::new(),
            icon_url: String::new(),
            is_locked: false,
            password: None,
            owner_id: None,
            note: String::new(),
            base_x: draft.x,
            base_y: draft.y,
            x: draft.x,
            y: draft.y,
            home,
            inner,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn home(&self) -> &Home {
        &self.home
    }

    /// The universe nested inside this node.
    pub fn inner(&self) -> &Universe {
        &self.inner
    }

    /// Snap the animated position back to the rest position.
    pub fn reset_position(&mut self) {
        self.x = self.base_x;
        self.y = self.base_y;
    }
}

// Transient animation state (x, y) is not part of a node's identity.
impl PartialEq for EntityNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.category == other.category
            && self.size == other.size
            && self.color == other.color
            && self.url == other.url
            && self.icon_url == other.icon_url
            && self.is_locked == other.is_locked
            && self.password == other.password
            && self.owner_id == other.owner_id
            && self.note == other.note
            && self.base_x == other.base_x
            && self.base_y == other.base_y
            && self.home == other.home
            && self.inner == other.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: std::collections::HashSet<_> = (0..1000).map(|_| NodeId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_category_roundtrips_unknown_values() {
        let c = Category::from("nebula".to_string());
        assert_eq!(c, Category::Other("nebula".to_string()));
        assert_eq!(String::from(c), "nebula");
        assert_eq!(Category::from("galaxy".to_string()), Category::Galaxy);
    }

    #[test]
    fn test_living_categories_get_cell_theme() {
        assert_eq!(Category::Life.inner_theme(), Theme::Cell);
        assert_eq!(Category::Microbe.inner_theme(), Theme::Cell);
        assert_eq!(Category::Star.inner_theme(), Theme::Space);
        assert_eq!(Category::Other("x".into()).inner_theme(), Theme::Space);
    }

    #[test]
    fn test_draft_builds_node_with_inner_universe() {
        let node = EntityNode::from_draft(
            NodeDraft::new("Amoeba", Category::Microbe).at(3.0, -4.0).size(12.0),
            Home::Root,
        );
        assert_eq!(node.inner.name, "Amoeba interior");
        assert_eq!(node.inner.theme(), &Theme::Cell);
        assert_eq!((node.base_x, node.base_y), (3.0, -4.0));
        assert_eq!((node.x, node.y), (3.0, -4.0));
        assert_eq!(node.size, 12.0);
    }

    #[test]
    fn test_equality_ignores_animated_position() {
        let mut a = EntityNode::from_draft(NodeDraft::new("n", Category::Star), Home::Root);
        let b = a.clone();
        a.x += 100.0;
        a.y -= 5.0;
        assert_eq!(a, b);
        a.reset_position();
        assert_eq!(a.x, a.base_x);
    }
}
