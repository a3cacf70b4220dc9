//! Native implementations of the core platform traits.

pub mod env_identity;

pub use env_identity::EnvIdentity;
