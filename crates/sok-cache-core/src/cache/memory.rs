use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{CacheStorage, CacheStore};
use crate::models::{CacheRequest, CachedResponse, StoredEntry};

type Entries = Arc<RwLock<BTreeMap<String, StoredEntry>>>;

/// In-process cache storage.
/// Clone is cheap and every clone sees the same stores.
#[derive(Clone, Default)]
pub struct MemoryCacheStorage {
    stores: Arc<RwLock<BTreeMap<String, Entries>>>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    type Store = MemoryCacheStore;

    async fn open(&self, name: &str) -> Result<MemoryCacheStore> {
        let mut stores = self.stores.write().await;
        let entries = stores.entry(name.to_string()).or_default().clone();
        Ok(MemoryCacheStore {
            name: name.to_string(),
            entries,
            stores: self.stores.clone(),
        })
    }

    async fn has(&self, name: &str) -> Result<bool> {
        Ok(self.stores.read().await.contains_key(name))
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        Ok(self.stores.write().await.remove(name).is_some())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.stores.read().await.keys().cloned().collect())
    }
}

/// Handle to one in-memory store.
/// After the store is deleted from its storage, lookups miss and writes fail.
#[derive(Clone)]
pub struct MemoryCacheStore {
    name: String,
    entries: Entries,
    stores: Arc<RwLock<BTreeMap<String, Entries>>>,
}

impl MemoryCacheStore {
    /// Whether the storage still holds this exact store. A store deleted and
    /// reopened under the same name is a different store.
    async fn is_live(&self) -> bool {
        self.stores
            .read()
            .await
            .get(&self.name)
            .is_some_and(|entries| Arc::ptr_eq(entries, &self.entries))
    }

    async fn ensure_live(&self) -> Result<()> {
        if !self.is_live().await {
            bail!("Cache store {} was deleted", self.name);
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, request: &CacheRequest) -> Result<Option<CachedResponse>> {
        if !self.is_live().await {
            return Ok(None);
        }
        let entries = self.entries.read().await;
        Ok(entries.get(&request.cache_key()).map(|e| e.response.clone()))
    }

    async fn put(&self, request: CacheRequest, response: CachedResponse) -> Result<()> {
        self.ensure_live().await?;
        let entry = StoredEntry::new(request, response);
        self.entries.write().await.insert(entry.key(), entry);
        Ok(())
    }

    async fn add_all(&self, batch: Vec<(CacheRequest, CachedResponse)>) -> Result<()> {
        self.ensure_live().await?;
        // Single write guard: readers never observe half a batch
        let mut entries = self.entries.write().await;
        for (request, response) in batch {
            let entry = StoredEntry::new(request, response);
            entries.insert(entry.key(), entry);
        }
        Ok(())
    }

    async fn delete(&self, request: &CacheRequest) -> Result<bool> {
        self.ensure_live().await?;
        Ok(self.entries.write().await.remove(&request.cache_key()).is_some())
    }

    async fn entries(&self) -> Result<Vec<StoredEntry>> {
        if !self.is_live().await {
            return Ok(Vec::new());
        }
        Ok(self.entries.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_and_reuses_store() {
        let storage = MemoryCacheStorage::new();
        assert!(!storage.has("sok-beauty-v1").await.unwrap());

        let first = storage.open("sok-beauty-v1").await.unwrap();
        first
            .put(CacheRequest::get("/"), CachedResponse::new(200, "home"))
            .await
            .unwrap();

        let second = storage.open("sok-beauty-v1").await.unwrap();
        let hit = second.match_request(&CacheRequest::get("/")).await.unwrap();
        assert_eq!(hit.map(|r| r.text()), Some("home".to_string()));
        assert!(storage.has("sok-beauty-v1").await.unwrap());
    }

    #[tokio::test]
    async fn test_stores_are_independent_by_name() {
        let storage = MemoryCacheStorage::new();
        let v1 = storage.open("sok-beauty-v1").await.unwrap();
        let v2 = storage.open("sok-beauty-v2").await.unwrap();
        v1.put(CacheRequest::get("/"), CachedResponse::new(200, "old"))
            .await
            .unwrap();

        assert!(v1.contains(&CacheRequest::get("/")).await.unwrap());
        assert!(!v2.contains(&CacheRequest::get("/")).await.unwrap());
        assert_eq!(storage.keys().await.unwrap(), vec!["sok-beauty-v1", "sok-beauty-v2"]);
    }

    #[tokio::test]
    async fn test_delete_store_and_entry() {
        let storage = MemoryCacheStorage::new();
        let store = storage.open("a-v1").await.unwrap();
        store
            .add_all(vec![
                (CacheRequest::get("/"), CachedResponse::new(200, "a")),
                (CacheRequest::get("/b"), CachedResponse::new(200, "b")),
            ])
            .await
            .unwrap();

        assert!(store.delete(&CacheRequest::get("/b")).await.unwrap());
        assert!(!store.delete(&CacheRequest::get("/b")).await.unwrap());
        assert_eq!(store.entries().await.unwrap().len(), 1);

        assert!(storage.delete("a-v1").await.unwrap());
        assert!(!storage.delete("a-v1").await.unwrap());
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_after_delete_keeps_store_deleted() {
        let storage = MemoryCacheStorage::new();
        let store = storage.open("old-v1").await.unwrap();
        store
            .put(CacheRequest::get("/"), CachedResponse::new(200, "x"))
            .await
            .unwrap();
        assert!(storage.delete("old-v1").await.unwrap());

        assert!(store.match_request(&CacheRequest::get("/")).await.unwrap().is_none());
        assert!(store
            .put(CacheRequest::get("/"), CachedResponse::new(200, "y"))
            .await
            .is_err());
        assert!(store
            .add_all(vec![(CacheRequest::get("/"), CachedResponse::new(200, "y"))])
            .await
            .is_err());
        assert!(!storage.has("old-v1").await.unwrap());

        // Reopening gives a fresh, empty store; the stale handle stays dead
        let fresh = storage.open("old-v1").await.unwrap();
        assert!(fresh.entries().await.unwrap().is_empty());
        assert!(store
            .put(CacheRequest::get("/"), CachedResponse::new(200, "z"))
            .await
            .is_err());
    }
}
