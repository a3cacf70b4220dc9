//! CLI command implementations.

pub mod session;
pub mod init;
pub mod show;
pub mod edit;
pub mod capsule;
pub mod log;
pub mod status;
pub mod reset;
