//! Encrypted, offline-first persistence for an infinitely nestable node graph.
//!
//! The graph lives in memory as a [`model::Cosmos`]. Saving flattens it into a
//! transport document, seals it with a password-derived AES-256-GCM key, and
//! writes the opaque blob to a local vault and (debounced) to a remote store.
//! Neither the remote store nor an exported file ever sees plaintext.

pub mod error;
pub mod constants;
pub mod traits;
pub mod crypto;
pub mod model;
pub mod codec;
pub mod activity;
pub mod vault;
pub mod sync;
pub mod capsule;
