//! Seams between the sync engine and the platform it runs on.

pub mod storage;
pub mod transport;
pub mod identity;
pub mod clock;

pub use clock::{Clock, SystemClock};
pub use identity::{Anonymous, Identity};
pub use storage::LocalVault;
pub use transport::{RemoteDocument, RemoteStore};
