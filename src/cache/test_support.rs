//! Shared fixtures for cache unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::cache::{DriverConfig, LockPayload, LOCKING_MEMCACHE_DRIVER};
use crate::config::ServerPairings;
use crate::entity::{DefaultValue, StorableObject};
use crate::error::{CacheError, Result};
use crate::store::{InMemoryStore, StoreClient};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleStorable {
    pub example_uint64: u64,
    pub example_string: String,
}

impl SimpleStorable {
    pub fn new(id: u64, text: &str) -> Self {
        Self {
            example_uint64: id,
            example_string: text.to_string(),
        }
    }
}

impl StorableObject for SimpleStorable {}

/// Config keyed on `example_uint64`, shaped like a local memcache setup.
pub struct TestConfig {
    servers: ServerPairings,
    lock_ttl: u32,
}

impl TestConfig {
    pub fn local() -> Self {
        Self {
            servers: ServerPairings::new().with("localhost", 11211),
            lock_ttl: 1,
        }
    }

    pub fn without_servers() -> Self {
        Self {
            servers: ServerPairings::new(),
            lock_ttl: 1,
        }
    }

    pub fn with_lock_ttl(mut self, ttl: u32) -> Self {
        self.lock_ttl = ttl;
        self
    }
}

impl DriverConfig<SimpleStorable> for TestConfig {
    fn driver(&self) -> &str {
        LOCKING_MEMCACHE_DRIVER
    }

    fn server_pairings(&self) -> &ServerPairings {
        &self.servers
    }

    fn ttl(&self) -> u32 {
        3600
    }

    fn create_key(&self, entity: &SimpleStorable) -> Result<String> {
        if entity.example_uint64.is_default_value() {
            return Err(CacheError::InvalidFieldValue {
                field: "example_uint64".to_string(),
                value: entity.example_uint64.to_string(),
            });
        }
        Ok(format!("lmc-ve-{}", entity.example_uint64))
    }

    fn create_lock_key(&self, entity: &SimpleStorable) -> Result<String> {
        Ok(format!("lmc-lock-{}", entity.example_uint64))
    }

    fn create_lock_payload(&self, entity: &SimpleStorable) -> LockPayload {
        LockPayload::from([("owner".to_string(), format!("test-{}", entity.example_uint64))])
    }

    fn lock_ttl(&self, _entity: &SimpleStorable) -> u32 {
        self.lock_ttl
    }
}

#[derive(Default)]
struct Calls {
    counts: HashMap<&'static str, usize>,
    ttls: HashMap<String, u32>,
}

/// Store client over an [`InMemoryStore`] that records every call.
#[derive(Clone)]
pub struct RecordingClient {
    store: InMemoryStore,
    calls: Arc<Mutex<Calls>>,
}

impl RecordingClient {
    pub fn new(store: InMemoryStore) -> Self {
        Self {
            store,
            calls: Arc::default(),
        }
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().counts.get(name).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().counts.values().sum()
    }

    pub fn last_ttl_for(&self, key: &str) -> Option<u32> {
        self.calls.lock().unwrap().ttls.get(key).copied()
    }

    fn record(&self, name: &'static str) {
        *self.calls.lock().unwrap().counts.entry(name).or_default() += 1;
    }

    fn record_ttl(&self, key: &str, ttl: u32) {
        self.calls.lock().unwrap().ttls.insert(key.to_string(), ttl);
    }
}

impl StoreClient for RecordingClient {
    fn add_server(&mut self, host: &str, port: u16) {
        self.record("add_server");
        self.store.add_server(host, port);
    }

    fn add(&mut self, key: &str, value: &[u8], flags: u32, ttl: u32) -> Result<bool> {
        self.record("add");
        self.record_ttl(key, ttl);
        self.store.add(key, value, flags, ttl)
    }

    fn set(&mut self, key: &str, value: &[u8], flags: u32, ttl: u32) -> Result<bool> {
        self.record("set");
        self.record_ttl(key, ttl);
        self.store.set(key, value, flags, ttl)
    }

    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        self.record("get");
        self.store.get(key)
    }

    fn delete(&mut self, key: &str) -> Result<bool> {
        self.record("delete");
        self.store.delete(key)
    }

    fn increment(&mut self, key: &str, step: u64) -> Result<Option<u64>> {
        self.record("increment");
        self.store.increment(key, step)
    }

    fn version(&mut self) -> Result<Option<String>> {
        self.record("version");
        self.store.version()
    }
}

/// Client whose every network call fails, as if the server were down.
pub struct UnreachableClient;

impl StoreClient for UnreachableClient {
    fn add_server(&mut self, _host: &str, _port: u16) {}

    fn add(&mut self, _key: &str, _value: &[u8], _flags: u32, _ttl: u32) -> Result<bool> {
        Err(CacheError::Connection("connection refused".to_string()))
    }

    fn set(&mut self, _key: &str, _value: &[u8], _flags: u32, _ttl: u32) -> Result<bool> {
        Err(CacheError::Connection("connection refused".to_string()))
    }

    fn get(&mut self, _key: &str) -> Result<Option<Vec<u8>>> {
        Err(CacheError::Connection("connection refused".to_string()))
    }

    fn delete(&mut self, _key: &str) -> Result<bool> {
        Err(CacheError::Connection("connection refused".to_string()))
    }

    fn increment(&mut self, _key: &str, _step: u64) -> Result<Option<u64>> {
        Err(CacheError::Connection("connection refused".to_string()))
    }

    fn version(&mut self) -> Result<Option<String>> {
        Err(CacheError::Connection("connection refused".to_string()))
    }
}
