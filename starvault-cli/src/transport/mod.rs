//! Network transport: HTTP client for the remote document store.

pub mod http;

pub use http::HttpRemote;
