//! Lock Manager Module
//!
//! Advisory locks stored as add-if-absent records under an entity's lock key.
//!
//! # Limitations
//! A lock has no owner and no fencing token. `lock` reports `true` both when
//! it creates the record and when the record already exists, and `unlock`
//! deletes the record whoever created it. Mutual exclusion is bounded by the
//! lock TTL: once the record expires a second caller can take it while the
//! first still believes it is protected.

use std::sync::Arc;

use tracing::debug;

use crate::cache::StoreDriver;
use crate::entity::StorableObject;
use crate::error::Result;

// == Lock Manager ==
/// Acquires and releases advisory locks for entities of type `E`.
pub struct LockManager<E: StorableObject> {
    driver: Arc<StoreDriver<E>>,
}

impl<E: StorableObject> LockManager<E> {
    pub fn new(driver: Arc<StoreDriver<E>>) -> Self {
        Self { driver }
    }

    // == Lock ==
    /// Marks `entity` as locked.
    ///
    /// Returns `true` whether the lock record was just created or was already
    /// present. Only key derivation, configuration and connection failures
    /// are errors.
    pub fn lock(&self, entity: &E) -> Result<bool> {
        let config = self.driver.config();
        let key = config.create_lock_key(entity)?;
        let ttl = config.lock_ttl(entity);
        let flags = config.lock_flags(entity);
        let payload = serde_json::to_string(&config.create_lock_payload(entity))?;

        if self.driver.direct_add(&key, payload.as_bytes(), flags, ttl)? {
            debug!(key = %key, ttl, "lock acquired");
        } else {
            debug!(key = %key, "lock already held");
        }
        Ok(true)
    }

    // == Unlock ==
    /// Removes the lock record for `entity`. Returns `true` even if there was
    /// no record to remove.
    pub fn unlock(&self, entity: &E) -> Result<bool> {
        let key = self.driver.config().create_lock_key(entity)?;

        if self.driver.direct_delete(&key)? {
            debug!(key = %key, "lock released");
        } else {
            debug!(key = %key, "lock was not held");
        }
        Ok(true)
    }
}
