//! Network access used on cache misses and during install.
//!
//! The proxy talks to the network only through the `Network` trait, so
//! tests can count or fail calls without a real connection. `HttpNetwork`
//! is the reqwest-backed implementation used by the binary.

pub mod client;
pub mod error;

use async_trait::async_trait;

use crate::models::{CacheRequest, CachedResponse};

pub use client::HttpNetwork;
pub use error::NetworkError;

#[async_trait]
pub trait Network: Send + Sync {
    /// Issue `request` and return whatever the server answered, whatever
    /// the status. Only transport failures are errors.
    async fn fetch(&self, request: &CacheRequest) -> Result<CachedResponse, NetworkError>;
}

#[async_trait]
impl<N: Network + ?Sized> Network for std::sync::Arc<N> {
    async fn fetch(&self, request: &CacheRequest) -> Result<CachedResponse, NetworkError> {
        (**self).fetch(request).await
    }
}
