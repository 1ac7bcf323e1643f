use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use super::{FetchOutcome, InstallReport, ProxyError};
use crate::cache::{CacheStorage, CacheStore};
use crate::manifest::{CacheName, Manifest};
use crate::models::{CacheRequest, CachedResponse};
use crate::network::{Network, NetworkError};

/// Populate the store named `cache_name` with every manifest URL.
///
/// Manifest entries are fetched concurrently, at most `max_concurrent` at a
/// time. Nothing is written unless every fetch returned a 2xx response; the
/// first failure aborts the remaining fetches and is returned as
/// [`ProxyError::InstallFailed`].
pub async fn handle_install<S, N>(
    storage: &S,
    network: &N,
    manifest: &Manifest,
    cache_name: &CacheName,
    max_concurrent: usize,
) -> Result<InstallReport, ProxyError>
where
    S: CacheStorage + ?Sized,
    N: Network + ?Sized,
{
    let name = cache_name.to_string();
    let store = storage.open(&name).await?;

    debug!(cache = %name, assets = manifest.len(), "Fetching manifest");

    let fetched: Vec<(CacheRequest, CachedResponse)> = stream::iter(manifest.requests())
        .map(move |request| async move {
            match network.fetch(&request).await {
                Ok(response) if response.is_ok() => Ok((request, response)),
                Ok(response) => {
                    let err = NetworkError::from_status(&request.url, response.status, &response.body);
                    Err((request.url, err))
                }
                Err(e) => Err((request.url, e)),
            }
        })
        .buffered(max_concurrent.max(1))
        .try_collect()
        .await
        .map_err(|(url, source)| {
            warn!(cache = %name, url = %url, error = %source, "Install failed");
            ProxyError::InstallFailed {
                cache_name: name.clone(),
                url,
                source,
            }
        })?;

    let cached: Vec<String> = fetched.iter().map(|(request, _)| request.url.clone()).collect();
    store.add_all(fetched).await?;

    info!(cache = %name, assets = cached.len(), "Install complete");
    Ok(InstallReport {
        cache_name: name,
        cached,
    })
}

/// Answer `request` from `store`, or from the network on a miss.
///
/// A store that fails to read is treated as a miss. Network failures on a
/// miss are returned unchanged. With `fill_on_miss`, successful GET
/// responses from the network are written back to the store.
pub async fn handle_fetch<S, N>(
    store: &S,
    network: &N,
    request: &CacheRequest,
    fill_on_miss: bool,
) -> Result<FetchOutcome, ProxyError>
where
    S: CacheStore + ?Sized,
    N: Network + ?Sized,
{
    match store.match_request(request).await {
        Ok(Some(response)) => {
            debug!(cache = store.name(), request = %request, "Cache hit");
            return Ok(FetchOutcome::from_cache(response));
        }
        Ok(None) => {
            debug!(cache = store.name(), request = %request, "Cache miss");
        }
        Err(e) => {
            warn!(cache = store.name(), request = %request, error = %e, "Cache lookup failed, using network");
        }
    }

    let response = network.fetch(request).await.map_err(|e| {
        warn!(request = %request, error = %e, "Network fetch failed");
        e
    })?;

    if fill_on_miss && request.is_get() && response.is_ok() {
        if let Err(e) = store.put(request.clone(), response.clone()).await {
            warn!(cache = store.name(), request = %request, error = %e, "Failed to store network response");
        }
    }

    Ok(FetchOutcome::from_network(response))
}

/// Delete every store except the one named `current`.
/// Returns the deleted names.
pub async fn handle_activate<S>(storage: &S, current: &CacheName) -> Result<Vec<String>, ProxyError>
where
    S: CacheStorage + ?Sized,
{
    let current = current.to_string();
    let mut deleted = Vec::new();
    for name in storage.keys().await? {
        if name == current {
            continue;
        }
        if storage.delete(&name).await? {
            info!(cache = %name, "Deleted stale cache");
            deleted.push(name);
        }
    }
    Ok(deleted)
}
