use anyhow::Result;
use async_trait::async_trait;

use crate::models::{CacheRequest, CachedResponse, StoredEntry};

/// A single named cache store.
#[async_trait]
pub trait CacheStore: Send + Sync {
    fn name(&self) -> &str;

    /// Look up the response stored for `request`, if any.
    async fn match_request(&self, request: &CacheRequest) -> Result<Option<CachedResponse>>;

    /// Store one response, replacing any entry with the same key.
    async fn put(&self, request: CacheRequest, response: CachedResponse) -> Result<()>;

    /// Store a batch of responses as one unit: either every entry becomes
    /// visible or, on error, none of them does.
    async fn add_all(&self, entries: Vec<(CacheRequest, CachedResponse)>) -> Result<()>;

    /// Remove the entry for `request`. Returns whether one existed.
    async fn delete(&self, request: &CacheRequest) -> Result<bool>;

    /// All entries, ordered by key
    async fn entries(&self) -> Result<Vec<StoredEntry>>;

    async fn contains(&self, request: &CacheRequest) -> Result<bool> {
        Ok(self.match_request(request).await?.is_some())
    }
}

/// Registry of named cache stores.
#[async_trait]
pub trait CacheStorage: Send + Sync {
    type Store: CacheStore;

    /// Open the store called `name`, creating an empty one if absent.
    async fn open(&self, name: &str) -> Result<Self::Store>;

    async fn has(&self, name: &str) -> Result<bool>;

    /// Delete the store called `name`. Returns whether one existed.
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Names of all existing stores, sorted
    async fn keys(&self) -> Result<Vec<String>>;
}
