//! Cache Module
//!
//! Object caching with advisory distributed locks over a memcache-like store.
//!
//! # Components
//! - [`DriverConfig`] - key derivation and TTL policy for one entity type
//! - [`StoreDriver`] - object get/set/add/delete plus raw store primitives
//! - [`LockManager`] - lock/unlock on top of add-if-absent
//! - [`LockableCache`] - the facade application code uses
//! - [`CacheRegistry`] - named caches, with a mock-driver switch for tests

mod driver;
mod driver_config;
mod facade;
mod lock;
mod registry;

#[cfg(test)]
mod property_tests;
#[cfg(test)]
mod test_support;

// Re-export public types
pub use driver::StoreDriver;
pub use driver_config::{
    DriverConfig, LockPayload, DEFAULT_LOCK_TTL, IN_MEMORY_DRIVER, LOCKING_MEMCACHE_DRIVER,
};
pub use facade::LockableCache;
pub use lock::LockManager;
pub use registry::CacheRegistry;
