//! Lockable Cache Module
//!
//! The interface application code uses: cached object access plus advisory
//! locking, both derived from the same config.

use std::sync::Arc;

use tracing::warn;

use crate::cache::{DriverConfig, LockManager, StoreDriver};
use crate::entity::StorableObject;
use crate::error::Result;
use crate::store::StoreClient;

// == Lockable Cache ==
/// Store driver and lock manager for entities of type `E`.
///
/// Keys are never derived here; the driver and lock manager ask the config, so
/// the data path and the lock path always agree.
pub struct LockableCache<E: StorableObject> {
    driver: Arc<StoreDriver<E>>,
    locks: LockManager<E>,
}

impl<E: StorableObject> LockableCache<E> {
    /// Creates a cache for `config` talking through `client`.
    pub fn new(config: Arc<dyn DriverConfig<E>>, client: Box<dyn StoreClient>) -> Self {
        let driver = Arc::new(StoreDriver::new(config, client));
        Self {
            locks: LockManager::new(Arc::clone(&driver)),
            driver,
        }
    }

    pub fn config(&self) -> &Arc<dyn DriverConfig<E>> {
        self.driver.config()
    }

    pub fn driver(&self) -> &StoreDriver<E> {
        &self.driver
    }

    pub fn connect(&self) -> Result<bool> {
        self.driver.connect()
    }

    pub fn ping(&self) -> Result<bool> {
        self.driver.ping()
    }

    pub fn get<'e>(
        &self,
        entity: &'e mut E,
        key_override: Option<&str>,
    ) -> Result<Option<&'e mut E>> {
        self.driver.get(entity, key_override)
    }

    pub fn set(
        &self,
        entity: &E,
        key_override: Option<&str>,
        ttl_override: Option<u32>,
    ) -> Result<bool> {
        self.driver.set(entity, key_override, ttl_override)
    }

    pub fn add(
        &self,
        entity: &E,
        key_override: Option<&str>,
        ttl_override: Option<u32>,
    ) -> Result<bool> {
        self.driver.add(entity, key_override, ttl_override)
    }

    pub fn delete(&self, entity: &E, key_override: Option<&str>) -> Result<bool> {
        self.driver.delete(entity, key_override)
    }

    /// See [`LockManager::lock`]: `true` also when already locked.
    pub fn lock(&self, entity: &E) -> Result<bool> {
        self.locks.lock(entity)
    }

    pub fn unlock(&self, entity: &E) -> Result<bool> {
        self.locks.unlock(entity)
    }

    // == With Lock ==
    /// Runs `critical` between `lock(entity)` and `unlock(entity)`.
    ///
    /// The unlock happens whether or not `critical` succeeds. An error from
    /// `critical` takes precedence over an unlock error.
    pub fn with_lock<T, F>(&self, entity: &E, critical: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        self.lock(entity)?;
        let outcome = critical(self);
        let released = self.unlock(entity);

        match (outcome, released) {
            (Ok(value), Ok(_)) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(unlock_err)) => {
                warn!(error = %unlock_err, "unlock failed after critical section error");
                Err(e)
            }
        }
    }
}
