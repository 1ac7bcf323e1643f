//! Named cache stores holding responses keyed by request.
//!
//! `CacheStorage` plays the role of the host's cache registry: it opens
//! stores by name, lists them and deletes them. A `CacheStore` is a single
//! named store. Two implementations are provided:
//! - `MemoryCacheStorage`: process-local, used by tests and embedding hosts
//! - `DiskCacheStorage`: one directory per store (JSON index plus raw body
//!   files), survives restarts
//!
//! Once a store is deleted, lookups through an existing handle miss and
//! writes through it fail; a write never recreates a deleted store.

pub mod disk;
pub mod memory;
pub mod store;

pub use disk::{DiskCacheStorage, DiskCacheStore};
pub use memory::{MemoryCacheStorage, MemoryCacheStore};
pub use store::{CacheStorage, CacheStore};
