//! Store Module
//!
//! The client seam between the cache drivers and a memcache-like key-value
//! store, with an in-memory implementation for tests and a blocking memcache
//! text-protocol client.

mod entry;
mod memcache;
mod memory;

pub use entry::StoredEntry;
pub use memcache::MemcacheClient;
pub use memory::InMemoryStore;

use crate::error::{CacheError, Result};

// == Public Constants ==
/// Maximum allowed key length in bytes (memcache limit)
pub const MAX_KEY_LENGTH: usize = 250;

/// Maximum allowed value size in bytes (memcache default item size)
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

/// Longest exptime memcached reads as relative seconds; larger values are
/// absolute Unix timestamps on the wire.
pub const MAX_RELATIVE_TTL: u32 = 60 * 60 * 24 * 30;

// == Store Client ==
/// Primitive operations of a memcache-like store.
///
/// Misses are not errors: `get` and `increment` return `Ok(None)` for an absent
/// key, `add` returns `Ok(false)` when the key exists and `delete` returns
/// `Ok(false)` when there was nothing to delete.
///
/// `flags` are passed through to the store on writes and never read back;
/// `get` returns only the value bytes. A `ttl` of 0 never expires and any
/// other value is relative to now, whatever its size.
///
/// Implementations are not required to be `Sync`; the driver serializes access.
pub trait StoreClient: Send {
    /// Registers a server. Connection is deferred until first use, so this
    /// cannot fail.
    fn add_server(&mut self, host: &str, port: u16);

    /// Writes `value` only if `key` does not exist yet.
    fn add(&mut self, key: &str, value: &[u8], flags: u32, ttl: u32) -> Result<bool>;

    /// Writes `value` unconditionally.
    fn set(&mut self, key: &str, value: &[u8], flags: u32, ttl: u32) -> Result<bool>;

    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>>;

    fn delete(&mut self, key: &str) -> Result<bool>;

    /// Increments a numeric value, returning the new value.
    fn increment(&mut self, key: &str, step: u64) -> Result<Option<u64>>;

    /// Asks the store for its version; `Ok(None)` when no server is registered.
    fn version(&mut self) -> Result<Option<String>>;
}

// == Validation ==
/// Rejects keys memcache would refuse: empty, too long, or containing
/// whitespace or control characters.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidKey("key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidKey(format!(
            "key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    if key.bytes().any(|b| b.is_ascii_whitespace() || b.is_ascii_control()) {
        return Err(CacheError::InvalidKey(format!(
            "key contains whitespace or control characters: {:?}",
            key
        )));
    }
    Ok(())
}

/// Rejects values larger than a store item.
pub fn validate_value(value: &[u8]) -> Result<()> {
    if value.len() > MAX_VALUE_SIZE {
        return Err(CacheError::InvalidRequest(format!(
            "Value exceeds maximum size of {} bytes",
            MAX_VALUE_SIZE
        )));
    }
    Ok(())
}
