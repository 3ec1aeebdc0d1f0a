//! In-Memory Store Module
//!
//! A process-local stand-in for memcache, used as the mock driver.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::error::{CacheError, Result};
use crate::store::{validate_key, validate_value, StoreClient, StoredEntry};

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, StoredEntry>,
    servers: Vec<(String, u16)>,
}

impl Inner {
    /// Returns the live entry for `key`, dropping it first if it has expired.
    fn live(&mut self, key: &str) -> Option<&mut StoredEntry> {
        if self.entries.get(key).is_some_and(StoredEntry::is_expired) {
            self.entries.remove(key);
        }
        self.entries.get_mut(key)
    }
}

// == In-Memory Store ==
/// Cloneable handle to a shared in-memory key-value map.
///
/// Clones observe the same entries, so several drivers handed clones of one
/// store behave like clients of one memcache server.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        // The map stays consistent even if a holder panicked mid-call.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns true if a live entry exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.inner().live(key).is_some()
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.inner().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner().entries.is_empty()
    }

    /// Removes all expired entries, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut inner = self.inner();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired());
        before - inner.entries.len()
    }
}

impl StoreClient for InMemoryStore {
    fn add_server(&mut self, host: &str, port: u16) {
        let mut inner = self.inner();
        if !inner.servers.iter().any(|(h, p)| h == host && *p == port) {
            inner.servers.push((host.to_string(), port));
        }
    }

    fn add(&mut self, key: &str, value: &[u8], _flags: u32, ttl: u32) -> Result<bool> {
        validate_key(key)?;
        validate_value(value)?;

        let mut inner = self.inner();
        if inner.live(key).is_some() {
            debug!(key, "add rejected, key exists");
            return Ok(false);
        }
        inner
            .entries
            .insert(key.to_string(), StoredEntry::new(value.to_vec(), ttl));
        Ok(true)
    }

    fn set(&mut self, key: &str, value: &[u8], _flags: u32, ttl: u32) -> Result<bool> {
        validate_key(key)?;
        validate_value(value)?;

        self.inner()
            .entries
            .insert(key.to_string(), StoredEntry::new(value.to_vec(), ttl));
        Ok(true)
    }

    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        Ok(self.inner().live(key).map(|entry| entry.value.clone()))
    }

    fn delete(&mut self, key: &str) -> Result<bool> {
        validate_key(key)?;
        let mut inner = self.inner();
        if inner.live(key).is_none() {
            return Ok(false);
        }
        Ok(inner.entries.remove(key).is_some())
    }

    fn increment(&mut self, key: &str, step: u64) -> Result<Option<u64>> {
        validate_key(key)?;
        let mut inner = self.inner();
        let Some(entry) = inner.live(key) else {
            return Ok(None);
        };

        let current: u64 = std::str::from_utf8(&entry.value)
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .ok_or_else(|| {
                CacheError::Protocol(
                    "cannot increment or decrement non-numeric value".to_string(),
                )
            })?;

        // memcache counters are unsigned 64-bit and wrap
        let next = current.wrapping_add(step);
        entry.value = next.to_string().into_bytes();
        Ok(Some(next))
    }

    fn version(&mut self) -> Result<Option<String>> {
        if self.inner().servers.is_empty() {
            return Ok(None);
        }
        Ok(Some(format!("in-memory-{}", env!("CARGO_PKG_VERSION"))))
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_add_is_add_if_absent() {
        let mut store = InMemoryStore::new();

        assert!(store.add("key1", b"first", 0, 0).unwrap());
        assert!(!store.add("key1", b"second", 0, 0).unwrap());
        assert_eq!(store.get("key1").unwrap().unwrap(), b"first");
    }

    #[test]
    fn test_set_overwrites() {
        let mut store = InMemoryStore::new();

        store.set("key1", b"value1", 0, 0).unwrap();
        store.set("key1", b"value2", 0, 0).unwrap();

        assert_eq!(store.get("key1").unwrap().unwrap(), b"value2");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let mut store = InMemoryStore::new();
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let mut store = InMemoryStore::new();

        store.set("key1", b"value1", 0, 0).unwrap();
        assert!(store.delete("key1").unwrap());
        assert!(!store.delete("key1").unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn test_clones_share_entries() {
        let mut a = InMemoryStore::new();
        let mut b = a.clone();

        a.set("shared", b"v", 0, 0).unwrap();
        assert_eq!(b.get("shared").unwrap().unwrap(), b"v");
        assert!(!b.add("shared", b"other", 0, 0).unwrap());
    }

    #[test]
    fn test_ttl_expiration() {
        let mut store = InMemoryStore::new();

        store.set("short", b"v", 0, 1).unwrap();
        assert!(store.contains("short"));

        sleep(Duration::from_millis(1100));

        assert!(store.get("short").unwrap().is_none());
        // an expired key can be added again
        assert!(store.add("short", b"again", 0, 1).unwrap());
    }

    #[test]
    fn test_purge_expired() {
        let mut store = InMemoryStore::new();

        store.set("key1", b"v", 0, 1).unwrap();
        store.set("key2", b"v", 0, 10).unwrap();

        sleep(Duration::from_millis(1100));

        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.contains("key2"));
    }

    #[test]
    fn test_increment() {
        let mut store = InMemoryStore::new();

        assert_eq!(store.increment("counter", 1).unwrap(), None);

        store.set("counter", b"10", 0, 0).unwrap();
        assert_eq!(store.increment("counter", 5).unwrap(), Some(15));
        assert_eq!(store.get("counter").unwrap().unwrap(), b"15");

        store.set("text", b"abc", 0, 0).unwrap();
        assert!(matches!(store.increment("text", 1), Err(CacheError::Protocol(_))));
    }

    #[test]
    fn test_version_requires_server() {
        let mut store = InMemoryStore::new();
        assert!(store.version().unwrap().is_none());

        store.add_server("localhost", 11211);
        store.add_server("localhost", 11211);
        assert!(store.version().unwrap().is_some());
    }

    #[test]
    fn test_rejects_invalid_key() {
        let mut store = InMemoryStore::new();
        assert!(matches!(
            store.set("bad key", b"v", 0, 0),
            Err(CacheError::InvalidKey(_))
        ));
    }
}
