use std::fmt;

use crate::models::{CacheRequest, CachedResponse};

/// Signals delivered to the proxy by its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Install,
    Activate,
    Fetch(CacheRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    Uninstalled,
    Installed,
    InstallFailed,
}

impl ProxyState {
    pub fn is_installed(&self) -> bool {
        matches!(self, ProxyState::Installed)
    }
}

impl fmt::Display for ProxyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProxyState::Uninstalled => "uninstalled",
            ProxyState::Installed => "installed",
            ProxyState::InstallFailed => "install failed",
        };
        f.write_str(label)
    }
}

/// Where a fetch was answered from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseSource::Cache => f.write_str("cache"),
            ResponseSource::Network => f.write_str("network"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub response: CachedResponse,
    pub source: ResponseSource,
}

impl FetchOutcome {
    pub fn from_cache(response: CachedResponse) -> Self {
        Self {
            response,
            source: ResponseSource::Cache,
        }
    }

    pub fn from_network(response: CachedResponse) -> Self {
        Self {
            response,
            source: ResponseSource::Network,
        }
    }

    pub fn is_cache_hit(&self) -> bool {
        self.source == ResponseSource::Cache
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub cache_name: String,
    pub cached: Vec<String>,
}

/// Result of dispatching one [`LifecycleEvent`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Installed(InstallReport),
    /// Names of the stale stores that were deleted
    Activated(Vec<String>),
    Fetched(FetchOutcome),
}
