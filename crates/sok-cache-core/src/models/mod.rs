//! Data models shared by the proxy, the cache stores and the network.
//!
//! - `CacheRequest`: the request descriptor a cache entry is keyed by
//! - `CachedResponse`: status, headers and body of a response
//! - `StoredEntry`: a response persisted in a cache store, with its timestamp

pub mod entry;
pub mod request;
pub mod response;

pub use entry::StoredEntry;
pub use request::CacheRequest;
pub use response::CachedResponse;
