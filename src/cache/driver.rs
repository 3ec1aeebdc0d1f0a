//! Store Driver Module
//!
//! Object-aware cache operations over a store client: key derivation, JSON
//! encoding and TTL policy in front of the raw add/get/set/delete primitives.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

use crate::cache::DriverConfig;
use crate::entity::StorableObject;
use crate::error::{CacheError, Result};
use crate::store::StoreClient;

/// Connection state owned by one driver.
struct Connection {
    client: Box<dyn StoreClient>,
    /// Set once every configured server has been registered with `client`.
    connected: bool,
}

// == Store Driver ==
/// Cache driver for entities of type `E`.
///
/// The client is behind a mutex, so a driver can be shared between threads;
/// calls on one driver are serialized. The connection goes
/// `Unconnected -> Connected` on first use and is never torn down. A dropped
/// socket surfaces as a failed operation.
pub struct StoreDriver<E: StorableObject> {
    config: Arc<dyn DriverConfig<E>>,
    connection: Mutex<Connection>,
}

impl<E: StorableObject> StoreDriver<E> {
    // == Constructor ==
    /// Creates an unconnected driver.
    pub fn new(config: Arc<dyn DriverConfig<E>>, client: Box<dyn StoreClient>) -> Self {
        Self {
            config,
            connection: Mutex::new(Connection {
                client,
                connected: false,
            }),
        }
    }

    pub fn config(&self) -> &Arc<dyn DriverConfig<E>> {
        &self.config
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        // Connection holds no invariant a panicking caller could break.
        self.connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_connected(&self) -> bool {
        self.connection().connected
    }

    // == Connect ==
    /// Registers the configured servers with the client. Idempotent.
    ///
    /// Fails with [`CacheError::NoServerPairsProvided`] without touching the
    /// client when the config lists no servers.
    pub fn connect(&self) -> Result<bool> {
        let mut connection = self.connection();
        self.connect_locked(&mut connection)
    }

    fn connect_locked(&self, connection: &mut Connection) -> Result<bool> {
        if connection.connected {
            return Ok(true);
        }

        let pairings = self.config.server_pairings();
        if pairings.is_empty() {
            return Err(CacheError::NoServerPairsProvided(format!(
                "driver={} entity={}",
                self.config.driver(),
                E::entity_name()
            )));
        }

        for (host, port) in pairings.iter() {
            connection.client.add_server(host, port);
        }
        connection.connected = true;

        info!(
            driver = self.config.driver(),
            servers = %pairings,
            "store driver connected"
        );
        Ok(true)
    }

    /// Ensures the connection, then runs `op` against the client.
    fn with_client<T>(&self, op: impl FnOnce(&mut dyn StoreClient) -> Result<T>) -> Result<T> {
        let mut connection = self.connection();
        self.connect_locked(&mut connection)?;
        op(connection.client.as_mut())
    }

    // == Ping ==
    /// Checks that the store answers a version request.
    ///
    /// Connection failures read as `Ok(false)`; configuration errors from
    /// connecting still propagate.
    pub fn ping(&self) -> Result<bool> {
        self.with_client(|client| match client.version() {
            Ok(version) => Ok(version.is_some()),
            Err(e) if e.is_connection_error() => {
                warn!(error = %e, "store liveness check failed");
                Ok(false)
            }
            Err(e) => Err(e),
        })
    }

    // == Direct Operations ==
    /// Increments a counter, returning the new value or 0 if the key is absent.
    ///
    /// The step is validated before any store access.
    pub fn direct_increment(&self, key: &str, step: i64) -> Result<u64> {
        if step <= 0 {
            return Err(CacheError::InvalidIncrementStep(step));
        }

        let value = self.with_client(|client| client.increment(key, step.unsigned_abs()))?;
        debug!(key, step, ?value, "increment");
        Ok(value.unwrap_or(0))
    }

    /// Writes `value` only if `key` is absent. Returns false if it existed.
    pub fn direct_add(&self, key: &str, value: &[u8], flags: u32, ttl: u32) -> Result<bool> {
        let added = self.with_client(|client| client.add(key, value, flags, ttl))?;
        debug!(key, flags, ttl, added, "add");
        Ok(added)
    }

    /// Deletes `key`. Returns false if nothing was stored under it.
    pub fn direct_delete(&self, key: &str) -> Result<bool> {
        let deleted = self.with_client(|client| client.delete(key))?;
        debug!(key, deleted, "delete");
        Ok(deleted)
    }

    // == Object Operations ==
    /// Stores `entity` unless its key already exists.
    pub fn add(
        &self,
        entity: &E,
        key_override: Option<&str>,
        ttl_override: Option<u32>,
    ) -> Result<bool> {
        let key = self.resolve_key(entity, key_override)?;
        let ttl = self.resolve_ttl(ttl_override);
        let body = entity.export_json()?;

        self.direct_add(&key, body.as_bytes(), 0, ttl)
    }

    /// Loads the cached body for `entity` into `entity` itself.
    ///
    /// Returns `None` on a miss. On a hit the same instance is returned, with
    /// its fields replaced by the cached ones.
    pub fn get<'e>(
        &self,
        entity: &'e mut E,
        key_override: Option<&str>,
    ) -> Result<Option<&'e mut E>> {
        let key = self.resolve_key(entity, key_override)?;

        let Some(data) = self.with_client(|client| client.get(&key))? else {
            debug!(key = %key, "get miss");
            return Ok(None);
        };

        let body = std::str::from_utf8(&data).map_err(|e| {
            CacheError::Protocol(format!("cached body for {} is not UTF-8: {}", key, e))
        })?;
        entity.import_json(body)?;

        debug!(key = %key, "get hit");
        Ok(Some(entity))
    }

    /// Stores `entity`, overwriting any existing value.
    pub fn set(
        &self,
        entity: &E,
        key_override: Option<&str>,
        ttl_override: Option<u32>,
    ) -> Result<bool> {
        let key = self.resolve_key(entity, key_override)?;
        let ttl = self.resolve_ttl(ttl_override);
        let body = entity.export_json()?;

        let stored = self.with_client(|client| client.set(&key, body.as_bytes(), 0, ttl))?;
        debug!(key = %key, ttl, stored, "set");
        Ok(stored)
    }

    /// Removes the cached body for `entity`. Returns false if none existed.
    pub fn delete(&self, entity: &E, key_override: Option<&str>) -> Result<bool> {
        let key = self.resolve_key(entity, key_override)?;
        self.direct_delete(&key)
    }

    fn resolve_key(&self, entity: &E, key_override: Option<&str>) -> Result<String> {
        match key_override {
            Some(key) if !key.is_empty() => Ok(key.to_string()),
            _ => self.config.create_key(entity),
        }
    }

    fn resolve_ttl(&self, ttl_override: Option<u32>) -> u32 {
        ttl_override.unwrap_or_else(|| self.config.ttl())
    }
}
