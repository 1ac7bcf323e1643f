use tokio::sync::RwLock;
use tracing::{debug, info};

use super::handlers::{handle_activate, handle_fetch, handle_install};
use super::{EventOutcome, FetchOutcome, InstallReport, LifecycleEvent, ProxyError, ProxyState};
use crate::cache::{CacheStorage, CacheStore};
use crate::manifest::{CacheName, Manifest};
use crate::models::CacheRequest;
use crate::network::Network;

/// Maximum manifest fetches in flight during install.
/// The manifest is small; 4 keeps install fast without flooding the origin.
pub const MAX_CONCURRENT_INSTALL_FETCHES: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyOptions {
    /// Write successful network responses back to the store on a miss
    pub fill_on_miss: bool,
    pub max_concurrent_fetches: usize,
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self {
            fill_on_miss: false,
            max_concurrent_fetches: MAX_CONCURRENT_INSTALL_FETCHES,
        }
    }
}

/// Cache-first proxy over an injected storage and network.
///
/// Fetches take `&self` and may run concurrently with each other and with
/// an install; the lifecycle state only changes once an install completes.
pub struct OfflineCacheProxy<S, N> {
    storage: S,
    network: N,
    manifest: Manifest,
    cache_name: CacheName,
    options: ProxyOptions,
    state: RwLock<ProxyState>,
}

impl<S, N> OfflineCacheProxy<S, N>
where
    S: CacheStorage,
    N: Network,
{
    pub fn new(storage: S, network: N, manifest: Manifest, cache_name: CacheName) -> Self {
        Self {
            storage,
            network,
            manifest,
            cache_name,
            options: ProxyOptions::default(),
            state: RwLock::new(ProxyState::Uninstalled),
        }
    }

    pub fn with_options(mut self, options: ProxyOptions) -> Self {
        self.options = options;
        self
    }

    /// Pick up a store populated by an earlier process.
    ///
    /// The proxy starts `Installed` when the store for the current cache name
    /// exists and holds every manifest entry.
    pub async fn resume(self) -> Result<Self, ProxyError> {
        let name = self.cache_name.to_string();
        if !self.storage.has(&name).await? {
            return Ok(self);
        }

        let store = self.storage.open(&name).await?;
        let mut complete = true;
        for request in self.manifest.requests() {
            if !store.contains(&request).await? {
                debug!(cache = %name, url = %request.url, "Stored cache incomplete, not resuming");
                complete = false;
                break;
            }
        }

        if complete {
            info!(cache = %name, "Resumed installed cache");
            *self.state.write().await = ProxyState::Installed;
        }
        Ok(self)
    }

    pub async fn state(&self) -> ProxyState {
        *self.state.read().await
    }

    pub fn cache_name(&self) -> &CacheName {
        &self.cache_name
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn options(&self) -> &ProxyOptions {
        &self.options
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    /// Route a lifecycle signal to its handler.
    pub async fn dispatch(&self, event: LifecycleEvent) -> Result<EventOutcome, ProxyError> {
        match event {
            LifecycleEvent::Install => self.install().await.map(EventOutcome::Installed),
            LifecycleEvent::Activate => self.activate().await.map(EventOutcome::Activated),
            LifecycleEvent::Fetch(request) => self.fetch(&request).await.map(EventOutcome::Fetched),
        }
    }

    pub async fn install(&self) -> Result<InstallReport, ProxyError> {
        let result = handle_install(
            &self.storage,
            &self.network,
            &self.manifest,
            &self.cache_name,
            self.options.max_concurrent_fetches,
        )
        .await;

        let next = if result.is_ok() {
            ProxyState::Installed
        } else {
            ProxyState::InstallFailed
        };
        *self.state.write().await = next;
        result
    }

    /// Delete stores left behind by other cache names
    pub async fn activate(&self) -> Result<Vec<String>, ProxyError> {
        handle_activate(&self.storage, &self.cache_name).await
    }

    /// Answer a request. Before a successful install nothing is intercepted
    /// and every request goes straight to the network.
    pub async fn fetch(&self, request: &CacheRequest) -> Result<FetchOutcome, ProxyError> {
        if !self.state().await.is_installed() {
            debug!(request = %request, "Not installed, passing through");
            let response = self.network.fetch(request).await?;
            return Ok(FetchOutcome::from_network(response));
        }

        let store = self.storage.open(&self.cache_name.to_string()).await?;
        handle_fetch(&store, &self.network, request, self.options.fill_on_miss).await
    }
}
