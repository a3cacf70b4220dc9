//! The acyclic, id-addressed form of a document, as serialized to JSON
//! before encryption. Documents and universes are written and read by
//! [`super::json`]; nodes and pairs carry their own serde impls.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{Category, Theme};

/// Accept `null` or a value of the wrong type as "absent".
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

#[derive(Debug, PartialEq)]
pub struct TransportDoc {
    pub version: u32,
    pub root: TransportUniverse,
    pub wormholes: Vec<TransportPair>,
    pub black_hole: Vec<TransportNode>,
}

#[derive(Debug, Default, PartialEq)]
pub struct TransportUniverse {
    pub name: Option<String>,
    pub theme: Theme,
    pub nodes: Option<Vec<TransportNode>>,
    pub links: Vec<TransportPair>,
}

// A derived drop would recurse once per nesting level.
impl Drop for TransportUniverse {
    fn drop(&mut self) {
        let mut stack = self.nodes.take().unwrap_or_default();
        while let Some(mut node) = stack.pop() {
            if let Some(mut inner) = node.inner_universe.take() {
                stack.extend(inner.nodes.take().unwrap_or_default());
            }
        }
    }
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportNode {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient")]
    pub category: Category,
    #[serde(default, deserialize_with = "lenient")]
    pub size: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub color: String,
    #[serde(default, deserialize_with = "lenient")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient")]
    pub icon_url: String,
    #[serde(default, deserialize_with = "lenient")]
    pub is_locked: bool,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "String::is_empty")]
    pub note: String,
    #[serde(default, deserialize_with = "lenient")]
    pub base_x: f64,
    #[serde(default, deserialize_with = "lenient")]
    pub base_y: f64,
    #[serde(skip)]
    pub inner_universe: Option<TransportUniverse>,
}

/// An undirected pair by id. Older documents spell the ends
/// `source`/`target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportPair {
    #[serde(rename = "sourceId", alias = "source")]
    pub source: String,
    #[serde(rename = "targetId", alias = "target")]
    pub target: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_pair_field_names() {
        let pair: TransportPair = serde_json::from_str(r#"{"source":"a","target":"b"}"#).unwrap();
        assert_eq!(pair.source, "a");
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["sourceId"], "a");
        assert_eq!(json["targetId"], "b");
    }

    #[test]
    fn test_node_fields_skip_interior_and_empty_extras() {
        let node = TransportNode {
            id: Some("n".to_string()),
            inner_universe: Some(TransportUniverse::default()),
            ..Default::default()
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["id"], "n");
        assert!(json.get("innerUniverse").is_none());
        assert!(json.get("note").is_none());
        assert!(json.get("password").is_none());
    }
}
