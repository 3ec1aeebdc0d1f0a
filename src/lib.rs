//! Lockable Cache - object caching with advisory distributed locks
//!
//! Caches typed entities as JSON in memcache, derives keys through a
//! per-entity config, and serializes concurrent mutation across processes
//! with add-if-absent lock records.

pub mod api;
pub mod cache;
pub mod config;
pub mod entity;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheRegistry, DriverConfig, LockManager, LockableCache, StoreDriver};
pub use config::{ServerPairings, Settings};
pub use entity::{DefaultValue, StorableObject};
pub use error::{CacheError, Result};
pub use tasks::spawn_cleanup_task;
