//! The cache-first offline proxy.
//!
//! Lifecycle: `Uninstalled` -> install -> `Installed` or `InstallFailed`.
//! Once installed, fetches are answered from the cache store named by the
//! current cache name and fall back to the network on a miss. An optional
//! activate step deletes stores left behind by older cache versions.
//!
//! The handlers in [`handlers`] are free functions over an explicit store,
//! network and manifest; [`OfflineCacheProxy`] owns those collaborators,
//! tracks the lifecycle state and dispatches [`LifecycleEvent`]s to them.

pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod service;

pub use error::ProxyError;
pub use handlers::{handle_activate, handle_fetch, handle_install};
pub use lifecycle::{
    EventOutcome, FetchOutcome, InstallReport, LifecycleEvent, ProxyState, ResponseSource,
};
pub use service::{OfflineCacheProxy, ProxyOptions};
