//! Cache Registry Module
//!
//! Maps logical cache names to their config and lazily built
//! [`LockableCache`] instance.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::info;

use crate::cache::{DriverConfig, LockableCache, IN_MEMORY_DRIVER, LOCKING_MEMCACHE_DRIVER};
use crate::config::Settings;
use crate::entity::StorableObject;
use crate::error::{CacheError, Result};
use crate::store::{InMemoryStore, MemcacheClient, StoreClient};

/// Alternate name accepted for the memcache driver.
const MEMCACHE_DRIVER: &str = "Memcache";

type Erased = Arc<dyn Any + Send + Sync>;

/// A registered config with the entity type it was registered for.
struct Registration {
    entity: &'static str,
    /// Holds an `Arc<dyn DriverConfig<E>>`.
    config: Erased,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn lookup_config<E: StorableObject>(
    registrations: &HashMap<String, Registration>,
    name: &str,
) -> Result<Arc<dyn DriverConfig<E>>> {
    let registration = registrations
        .get(name)
        .ok_or_else(|| CacheError::UnknownCache(name.to_string()))?;

    registration
        .config
        .downcast_ref::<Arc<dyn DriverConfig<E>>>()
        .cloned()
        .ok_or_else(|| CacheError::InvalidEntity {
            expected: registration.entity.to_string(),
            found: E::entity_name().to_string(),
        })
}

// == Cache Registry ==
/// Named caches for one application, passed to whatever needs cache access.
///
/// Each name is bound to one entity type at registration. Looking a name up
/// with another type fails with [`CacheError::InvalidEntity`].
pub struct CacheRegistry {
    settings: Settings,
    registrations: RwLock<HashMap<String, Registration>>,
    caches: RwLock<HashMap<String, Erased>>,
    mock_drivers: AtomicBool,
    mock_store: InMemoryStore,
}

impl CacheRegistry {
    // == Constructors ==
    /// Creates a registry. Mock drivers start as `settings.mock_drivers`.
    pub fn new(settings: Settings) -> Self {
        let mock_drivers = AtomicBool::new(settings.mock_drivers);
        Self {
            settings,
            registrations: RwLock::new(HashMap::new()),
            caches: RwLock::new(HashMap::new()),
            mock_drivers,
            mock_store: InMemoryStore::new(),
        }
    }

    /// Creates a registry whose caches all use the shared in-memory store.
    pub fn with_mock_drivers(settings: Settings) -> Self {
        let registry = Self::new(settings);
        registry.enable_mock_drivers();
        registry
    }

    // == Registration ==
    /// Binds `name` to `config`. Re-registering a name replaces its config
    /// and drops any instance built from the old one.
    pub fn register<E, C>(&self, name: impl Into<String>, config: C)
    where
        E: StorableObject,
        C: DriverConfig<E> + 'static,
    {
        let name = name.into();
        let config: Arc<dyn DriverConfig<E>> = Arc::new(config);

        // Lock order is registrations, then caches.
        let mut registrations = write(&self.registrations);
        let mut caches = write(&self.caches);
        caches.remove(&name);
        registrations.insert(
            name,
            Registration {
                entity: E::entity_name(),
                config: Arc::new(config),
            },
        );
    }

    pub fn is_registered(&self, name: &str) -> bool {
        read(&self.registrations).contains_key(name)
    }

    /// Returns true if an instance has been built for `name`.
    pub fn is_built(&self, name: &str) -> bool {
        read(&self.caches).contains_key(name)
    }

    // == Lookup ==
    /// Returns the config registered under `name`.
    pub fn config<E: StorableObject>(&self, name: &str) -> Result<Arc<dyn DriverConfig<E>>> {
        lookup_config(&read(&self.registrations), name)
    }

    /// Returns the cache for `name`, building it on first use.
    pub fn cache<E: StorableObject>(&self, name: &str) -> Result<Arc<LockableCache<E>>> {
        let existing = read(&self.caches).get(name).cloned();
        if let Some(built) = existing {
            return self.downcast_cache(name, built);
        }

        let built = {
            // Held until the instance is stored, so a concurrent register
            // cannot swap the config in between.
            let registrations = read(&self.registrations);
            let config = lookup_config::<E>(&registrations, name)?;
            let client = self.create_client(config.driver())?;
            info!(
                cache = name,
                driver = config.driver(),
                mock = self.mock_drivers_enabled(),
                "building lockable cache"
            );
            let built: Erased = Arc::new(LockableCache::new(config, client));

            // Another thread may have built the same name meanwhile; first one wins.
            write(&self.caches)
                .entry(name.to_string())
                .or_insert(built)
                .clone()
        };
        self.downcast_cache(name, built)
    }

    fn downcast_cache<E: StorableObject>(
        &self,
        name: &str,
        built: Erased,
    ) -> Result<Arc<LockableCache<E>>> {
        built.downcast::<LockableCache<E>>().map_err(|_| {
            let expected = read(&self.registrations)
                .get(name)
                .map(|r| r.entity.to_string())
                .unwrap_or_default();
            CacheError::InvalidEntity {
                expected,
                found: E::entity_name().to_string(),
            }
        })
    }

    fn create_client(&self, driver: &str) -> Result<Box<dyn StoreClient>> {
        if self.mock_drivers_enabled() {
            return Ok(Box::new(self.mock_store.clone()));
        }

        match driver {
            LOCKING_MEMCACHE_DRIVER | MEMCACHE_DRIVER => {
                Ok(Box::new(MemcacheClient::from_settings(&self.settings)))
            }
            IN_MEMORY_DRIVER => Ok(Box::new(self.mock_store.clone())),
            other => Err(CacheError::UnknownDriver(other.to_string())),
        }
    }

    // == Test Support ==
    /// Makes caches built from now on use the shared in-memory store.
    ///
    /// Instances already built keep their client; call [`CacheRegistry::clear`]
    /// to rebuild them.
    pub fn enable_mock_drivers(&self) {
        self.mock_drivers.store(true, Ordering::SeqCst);
    }

    /// Makes caches built from now on use the driver named by their config.
    pub fn disable_mock_drivers(&self) {
        self.mock_drivers.store(false, Ordering::SeqCst);
    }

    pub fn mock_drivers_enabled(&self) -> bool {
        self.mock_drivers.load(Ordering::SeqCst)
    }

    /// Drops every built instance. Registrations are kept.
    pub fn clear(&self) {
        write(&self.caches).clear();
    }

    /// The in-memory store shared by mock and `InMemory` caches.
    pub fn mock_store(&self) -> &InMemoryStore {
        &self.mock_store
    }
}
