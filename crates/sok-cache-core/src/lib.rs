//! Core library for sok-cache.
//!
//! A cache-first offline proxy for the SOK Beauty site: on install it fetches
//! a fixed manifest of critical assets into a versioned cache store, and
//! afterwards answers requests from that store, falling back to the network
//! on a miss.
//!
//! This crate contains:
//! - `proxy`: lifecycle state, event dispatch and the install/fetch/activate handlers
//! - `cache`: named cache stores (in-memory and on-disk)
//! - `network`: the network seam and its reqwest implementation
//! - `manifest`: the asset manifest and versioned cache names
//! - `models`: request, response and stored-entry types

pub mod cache;
pub mod manifest;
pub mod models;
pub mod network;
pub mod proxy;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheStorage, CacheStore, DiskCacheStorage, MemoryCacheStorage};
pub use manifest::{CacheName, Manifest, ManifestError};
pub use models::{CacheRequest, CachedResponse, StoredEntry};
pub use network::{HttpNetwork, Network, NetworkError};
pub use proxy::{
    EventOutcome, FetchOutcome, InstallReport, LifecycleEvent, OfflineCacheProxy, ProxyError,
    ProxyOptions, ProxyState, ResponseSource,
};
