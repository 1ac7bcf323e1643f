use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use super::{CacheStorage, CacheStore};
use crate::models::{CacheRequest, CachedResponse, StoredEntry};

/// Index file inside each store directory
const INDEX_FILE: &str = "index.json";

/// Subdirectory holding one raw file per response body
const BODIES_DIR: &str = "bodies";

/// Header values are kept as text when they are valid UTF-8 and as raw
/// bytes otherwise.
#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum HeaderValue {
    Text(String),
    Raw(Vec<u8>),
}

impl HeaderValue {
    fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => HeaderValue::Text(text.to_string()),
            Err(_) => HeaderValue::Raw(bytes.to_vec()),
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        match self {
            HeaderValue::Text(text) => text.into_bytes(),
            HeaderValue::Raw(bytes) => bytes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexEntry {
    request: CacheRequest,
    status: u16,
    headers: Vec<(String, HeaderValue)>,
    /// Name of the body file under `bodies/`
    body: u64,
    stored_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreIndex {
    next_body: u64,
    entries: BTreeMap<String, IndexEntry>,
}

/// Cache storage persisted under a directory, one subdirectory per store.
///
/// A store directory holds a small JSON index plus one raw file per body, so
/// a lookup reads the index and a single body. Every write replaces the
/// index through a temporary file and a rename; that rename is the commit
/// point for a whole batch.
#[derive(Clone)]
pub struct DiskCacheStorage {
    root: PathBuf,
    // Writers take it exclusively, readers shared, across all store handles
    lock: Arc<RwLock<()>>,
}

impl DiskCacheStorage {
    pub fn new(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create cache directory: {}", root.display()))?;
        Ok(Self {
            root,
            lock: Arc::new(RwLock::new(())),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn store_dir(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
            bail!("Invalid cache store name: '{}'", name);
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl CacheStorage for DiskCacheStorage {
    type Store = DiskCacheStore;

    async fn open(&self, name: &str) -> Result<DiskCacheStore> {
        let dir = self.store_dir(name)?;
        let store = DiskCacheStore {
            name: name.to_string(),
            dir,
            lock: self.lock.clone(),
        };

        let _guard = self.lock.write().await;
        if !store.index_path().exists() {
            debug!(store = name, path = %store.dir.display(), "Creating cache store");
            std::fs::create_dir_all(store.dir.join(BODIES_DIR))
                .with_context(|| format!("Failed to create cache store: {}", name))?;
            write_index(&store.index_path(), &StoreIndex::default())?;
        }
        Ok(store)
    }

    async fn has(&self, name: &str) -> Result<bool> {
        Ok(self.store_dir(name)?.join(INDEX_FILE).exists())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        let dir = self.store_dir(name)?;
        let _guard = self.lock.write().await;
        if !dir.join(INDEX_FILE).exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&dir)
            .with_context(|| format!("Failed to delete cache store: {}", name))?;
        Ok(true)
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let dir = std::fs::read_dir(&self.root)
            .with_context(|| format!("Failed to list cache directory: {}", self.root.display()))?;
        for entry in dir {
            let path = entry?.path();
            if !path.join(INDEX_FILE).is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// Handle to one store directory.
///
/// Once the store is deleted, lookups through the handle miss and writes
/// fail; a write never brings a deleted store back.
#[derive(Clone)]
pub struct DiskCacheStore {
    name: String,
    dir: PathBuf,
    lock: Arc<RwLock<()>>,
}

impl DiskCacheStore {
    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    fn body_path(&self, id: u64) -> PathBuf {
        self.dir.join(BODIES_DIR).join(id.to_string())
    }

    /// `None` once the store has been deleted
    fn read_index(&self) -> Result<Option<StoreIndex>> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache store: {}", self.name))?;
        let index = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache store: {}", self.name))?;
        Ok(Some(index))
    }

    fn index_for_write(&self) -> Result<StoreIndex> {
        match self.read_index()? {
            Some(index) => Ok(index),
            None => bail!("Cache store {} was deleted", self.name),
        }
    }

    fn read_entry(&self, entry: IndexEntry) -> Result<StoredEntry> {
        let body = std::fs::read(self.body_path(entry.body))
            .with_context(|| format!("Failed to read cached body for {}", entry.request))?;
        let headers = entry
            .headers
            .into_iter()
            .map(|(name, value)| (name, value.into_bytes()))
            .collect();
        Ok(StoredEntry {
            request: entry.request,
            response: CachedResponse {
                status: entry.status,
                headers,
                body,
            },
            stored_at: entry.stored_at,
        })
    }

    /// Write the bodies, then commit the index. Replaced bodies are removed
    /// only after the commit.
    fn insert(&self, batch: Vec<(CacheRequest, CachedResponse)>) -> Result<()> {
        let mut index = self.index_for_write()?;
        let mut replaced = Vec::new();

        for (request, response) in batch {
            let id = index.next_body;
            index.next_body += 1;
            std::fs::write(self.body_path(id), &response.body)
                .with_context(|| format!("Failed to write cached body for {}", request))?;

            let entry = IndexEntry {
                status: response.status,
                headers: response
                    .headers
                    .iter()
                    .map(|(name, value)| (name.clone(), HeaderValue::from_bytes(value)))
                    .collect(),
                body: id,
                stored_at: Utc::now(),
                request,
            };
            if let Some(old) = index.entries.insert(entry.request.cache_key(), entry) {
                replaced.push(old.body);
            }
        }

        write_index(&self.index_path(), &index)?;
        self.remove_bodies(&replaced);
        Ok(())
    }

    fn remove_bodies(&self, ids: &[u64]) {
        for id in ids {
            if let Err(e) = std::fs::remove_file(self.body_path(*id)) {
                debug!(store = %self.name, body = id, error = %e, "Failed to remove replaced body");
            }
        }
    }
}

#[async_trait]
impl CacheStore for DiskCacheStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn match_request(&self, request: &CacheRequest) -> Result<Option<CachedResponse>> {
        let _guard = self.lock.read().await;
        let Some(mut index) = self.read_index()? else {
            return Ok(None);
        };
        match index.entries.remove(&request.cache_key()) {
            Some(entry) => Ok(Some(self.read_entry(entry)?.response)),
            None => Ok(None),
        }
    }

    async fn put(&self, request: CacheRequest, response: CachedResponse) -> Result<()> {
        let _guard = self.lock.write().await;
        self.insert(vec![(request, response)])
    }

    async fn add_all(&self, batch: Vec<(CacheRequest, CachedResponse)>) -> Result<()> {
        let _guard = self.lock.write().await;
        self.insert(batch)
    }

    async fn delete(&self, request: &CacheRequest) -> Result<bool> {
        let _guard = self.lock.write().await;
        let mut index = self.index_for_write()?;
        let Some(old) = index.entries.remove(&request.cache_key()) else {
            return Ok(false);
        };
        write_index(&self.index_path(), &index)?;
        self.remove_bodies(&[old.body]);
        Ok(true)
    }

    async fn entries(&self) -> Result<Vec<StoredEntry>> {
        let _guard = self.lock.read().await;
        let Some(index) = self.read_index()? else {
            return Ok(Vec::new());
        };
        index
            .entries
            .into_values()
            .map(|entry| self.read_entry(entry))
            .collect()
    }
}

fn write_index(path: &Path, index: &StoreIndex) -> Result<()> {
    let contents = serde_json::to_string_pretty(index)?;
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents)
        .with_context(|| format!("Failed to write cache index: {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to commit cache index: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> (tempfile::TempDir, DiskCacheStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = DiskCacheStorage::new(dir.path().join("stores")).unwrap();
        (dir, storage)
    }

    fn body_files(storage: &DiskCacheStorage, name: &str) -> usize {
        std::fs::read_dir(storage.root().join(name).join(BODIES_DIR))
            .unwrap()
            .count()
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let (dir, storage) = storage();
        let store = storage.open("sok-beauty-v1").await.unwrap();
        store
            .add_all(vec![
                (CacheRequest::get("/"), CachedResponse::new(200, "<html>")),
                (
                    CacheRequest::get("/css/styles.css"),
                    CachedResponse::new(200, "body {}").with_header("Content-Type", "text/css"),
                ),
            ])
            .await
            .unwrap();

        // Fresh storage over the same directory, as after a restart
        let reopened = DiskCacheStorage::new(dir.path().join("stores")).unwrap();
        let store = reopened.open("sok-beauty-v1").await.unwrap();
        let css = store
            .match_request(&CacheRequest::get("/css/styles.css"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(css.text(), "body {}");
        assert_eq!(css.header_str("content-type"), Some("text/css"));
        assert_eq!(store.entries().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_binary_body_and_raw_header_stored_verbatim() {
        let (_dir, storage) = storage();
        let store = storage.open("sok-beauty-v1").await.unwrap();
        let logo: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
        let response = CachedResponse::new(200, logo.clone())
            .with_header("Content-Type", "image/webp")
            .with_header("X-Name", b"caf\xE9".to_vec());
        store
            .put(CacheRequest::get("/images/logo.webp"), response.clone())
            .await
            .unwrap();

        let body_path = storage.root().join("sok-beauty-v1").join(BODIES_DIR).join("0");
        assert_eq!(std::fs::read(body_path).unwrap(), logo);

        let hit = store
            .match_request(&CacheRequest::get("/images/logo.webp"))
            .await
            .unwrap();
        assert_eq!(hit, Some(response));
    }

    #[tokio::test]
    async fn test_replacing_entry_removes_old_body() {
        let (_dir, storage) = storage();
        let store = storage.open("a-v1").await.unwrap();
        store
            .put(CacheRequest::get("/"), CachedResponse::new(200, "first"))
            .await
            .unwrap();
        store
            .put(CacheRequest::get("/"), CachedResponse::new(200, "second"))
            .await
            .unwrap();

        let hit = store.match_request(&CacheRequest::get("/")).await.unwrap().unwrap();
        assert_eq!(hit.text(), "second");
        assert_eq!(body_files(&storage, "a-v1"), 1);
    }

    #[tokio::test]
    async fn test_keys_lists_store_directories_only() {
        let (_dir, storage) = storage();
        storage.open("sok-beauty-v2").await.unwrap();
        storage.open("sok-beauty-v1").await.unwrap();
        std::fs::write(storage.root().join("notes.txt"), "x").unwrap();
        std::fs::create_dir(storage.root().join("stray")).unwrap();

        assert_eq!(storage.keys().await.unwrap(), vec!["sok-beauty-v1", "sok-beauty-v2"]);
        assert!(storage.has("sok-beauty-v1").await.unwrap());
        assert!(!storage.has("sok-beauty-v3").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_store() {
        let (_dir, storage) = storage();
        let store = storage.open("old-v1").await.unwrap();
        store
            .put(CacheRequest::get("/"), CachedResponse::new(200, "x"))
            .await
            .unwrap();

        assert!(storage.delete("old-v1").await.unwrap());
        assert!(!storage.delete("old-v1").await.unwrap());
        assert!(store.match_request(&CacheRequest::get("/")).await.unwrap().is_none());
        assert!(store.entries().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_write_after_delete_keeps_store_deleted() {
        let (_dir, storage) = storage();
        let store = storage.open("old-v1").await.unwrap();
        assert!(storage.delete("old-v1").await.unwrap());

        let put = store
            .put(CacheRequest::get("/"), CachedResponse::new(200, "x"))
            .await;
        assert!(put.is_err());
        let batch = store
            .add_all(vec![(CacheRequest::get("/"), CachedResponse::new(200, "x"))])
            .await;
        assert!(batch.is_err());
        assert!(store.delete(&CacheRequest::get("/")).await.is_err());

        assert!(!storage.has("old-v1").await.unwrap());
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_entry() {
        let (_dir, storage) = storage();
        let store = storage.open("a-v1").await.unwrap();
        store
            .put(CacheRequest::get("/x"), CachedResponse::new(200, "x"))
            .await
            .unwrap();
        assert!(store.delete(&CacheRequest::get("/x")).await.unwrap());
        assert!(!store.contains(&CacheRequest::get("/x")).await.unwrap());
        assert_eq!(body_files(&storage, "a-v1"), 0);
    }

    #[tokio::test]
    async fn test_rejects_path_like_names() {
        let (_dir, storage) = storage();
        assert!(storage.open("../escape").await.is_err());
        assert!(storage.open("").await.is_err());
    }
}
