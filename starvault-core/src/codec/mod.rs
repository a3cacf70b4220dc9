//! Conversion between the in-memory graph and the bytes that get sealed.
//!
//! Every step (`flatten`, JSON text, `restore`) walks with an explicit
//! stack, so nesting depth is bounded by memory, not by the call stack.

pub mod flatten;
pub mod json;
pub mod restore;
pub mod transport;

use crate::crypto::{self, KeyMaterial, SealedBlob};
use crate::error::Result;
use crate::model::Cosmos;

pub use flatten::flatten;
pub use restore::{restore, RestoreReport};
pub use transport::{TransportDoc, TransportNode, TransportPair, TransportUniverse};

/// A decoded document plus whatever had to be repaired along the way.
#[derive(Debug, Clone)]
pub struct Restored {
    pub cosmos: Cosmos,
    pub report: RestoreReport,
}

/// Serialize the graph to transport JSON.
pub fn encode(cosmos: &Cosmos) -> Result<Vec<u8>> {
    serialize(&flatten(cosmos))
}

/// Serialize an already flattened document.
pub fn serialize(doc: &TransportDoc) -> Result<Vec<u8>> {
    json::write_doc(doc)
}

/// Parse transport JSON and rebuild the graph.
pub fn decode(bytes: &[u8]) -> Result<Restored> {
    let (cosmos, report) = restore(json::read_doc(bytes)?)?;
    Ok(Restored { cosmos, report })
}

/// Encode and encrypt in one step.
pub fn seal(cosmos: &Cosmos, key: &KeyMaterial) -> Result<SealedBlob> {
    let plaintext = encode(cosmos)?;
    Ok(crypto::encrypt(&plaintext, key)?)
}

/// Decrypt and decode in one step. A wrong key surfaces as
/// [`crate::error::StarVaultError::Decryption`] and never as a malformed document.
pub fn open(blob: &SealedBlob, key: &KeyMaterial) -> Result<Restored> {
    let plaintext = crypto::decrypt(blob, key)?;
    decode(&plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::derive_key;
    use crate::error::StarVaultError;
    use crate::model::{Category, NodeDraft, NodeId, UniverseRef};

    const SALT: &[u8] = b"codec-test-salt-0123456789";

    #[test]
    fn test_encode_decode_preserves_document() {
        let mut cosmos = Cosmos::genesis("Home");
        let ids: Vec<NodeId> = cosmos.root().node_ids().to_vec();
        cosmos.add_wormhole(&ids[0], &ids[1]);

        let bytes = encode(&cosmos).unwrap();
        let restored = decode(&bytes).unwrap();
        assert!(restored.report.is_clean());
        assert_eq!(restored.cosmos, cosmos);
    }

    #[test]
    fn test_deep_nesting_survives_codec() {
        const DEPTH: usize = 50_000;
        let mut cosmos = Cosmos::new("Deep");
        let mut at = UniverseRef::Root;
        let mut deepest = None;
        for i in 0..DEPTH {
            let id = cosmos
                .add_node(&at, NodeDraft::new(format!("L{i}"), Category::Galaxy))
                .unwrap();
            at = UniverseRef::Inner(id.clone());
            deepest = Some(id);
        }
        let deepest = deepest.unwrap();
        let top = cosmos.root().node_ids()[0].clone();
        cosmos.add_wormhole(&top, &deepest);

        let bytes = encode(&cosmos).unwrap();
        drop(cosmos);

        let restored = decode(&bytes).unwrap();
        assert!(restored.report.is_clean());
        assert_eq!(restored.cosmos.len(), DEPTH);
        assert_eq!(restored.cosmos.depth_of(&deepest), Some(DEPTH - 1));
        assert_eq!(restored.cosmos.wormholes().len(), 1);
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(matches!(decode(b"\x00\x01garbage"), Err(StarVaultError::Malformed(_))));
    }

    #[test]
    fn test_open_with_wrong_key_is_decryption_error() {
        let key = derive_key("correct horse", SALT).unwrap();
        let other = derive_key("battery staple", SALT).unwrap();
        let blob = seal(&Cosmos::genesis("Home"), &key).unwrap();

        assert!(matches!(open(&blob, &other), Err(StarVaultError::Decryption)));
        assert_eq!(open(&blob, &key).unwrap().cosmos.root().len(), 2);
    }
}
