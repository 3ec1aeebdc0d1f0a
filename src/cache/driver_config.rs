//! Driver Config Module
//!
//! Key derivation and TTL policy for one logical cache.

use std::collections::BTreeMap;

use crate::config::ServerPairings;
use crate::entity::StorableObject;
use crate::error::Result;

/// Driver name for the memcache-backed lockable cache.
pub const LOCKING_MEMCACHE_DRIVER: &str = "LockingMemcache";

/// Driver name for the process-local store.
pub const IN_MEMORY_DRIVER: &str = "InMemory";

/// Default lifetime of a lock record in seconds.
pub const DEFAULT_LOCK_TTL: u32 = 1;

/// Auxiliary metadata stored as the body of a lock record.
pub type LockPayload = BTreeMap<String, String>;

// == Driver Config ==
/// Immutable policy for one logical cache, typed over the single entity shape
/// it derives keys for.
///
/// Derivations must be pure. They fail with
/// [`CacheError::InvalidEntity`](crate::error::CacheError::InvalidEntity) for
/// an entity variant the config does not handle, and with
/// [`CacheError::InvalidFieldValue`](crate::error::CacheError::InvalidFieldValue)
/// when an identifying field is unset. A default value is never embedded in a
/// key.
pub trait DriverConfig<E: StorableObject>: Send + Sync {
    /// Name of the store driver implementation to use.
    fn driver(&self) -> &str;

    /// Servers to register on connect. Empty is fatal at connect time.
    fn server_pairings(&self) -> &ServerPairings;

    /// Default entry lifetime in seconds, 0 meaning no expiry.
    fn ttl(&self) -> u32;

    /// Primary data key for `entity`.
    fn create_key(&self, entity: &E) -> Result<String>;

    /// Lock key for `entity`, in a namespace disjoint from data keys.
    fn create_lock_key(&self, entity: &E) -> Result<String>;

    fn create_lock_payload(&self, _entity: &E) -> LockPayload {
        LockPayload::new()
    }

    fn lock_ttl(&self, _entity: &E) -> u32 {
        DEFAULT_LOCK_TTL
    }

    fn lock_flags(&self, _entity: &E) -> u32 {
        0
    }
}
