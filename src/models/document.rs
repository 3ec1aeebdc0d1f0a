//! Document entity served by the HTTP API, and its cache config.

use serde::{Deserialize, Serialize};

use crate::cache::{DriverConfig, LockPayload, LOCKING_MEMCACHE_DRIVER};
use crate::config::{ServerPairings, Settings};
use crate::entity::{DefaultValue, StorableObject};
use crate::error::{CacheError, Result};

/// Registry name of the document cache.
pub const DOCUMENT_CACHE: &str = "Documents";

/// A cached text document, identified by a non-zero `id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: u64,
    pub text: String,
}

impl Document {
    pub fn new(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }

    /// A document carrying only its identifier, used to look others up.
    pub fn with_id(id: u64) -> Self {
        Self::new(id, String::new())
    }
}

impl StorableObject for Document {
    fn entity_name() -> &'static str {
        "Document"
    }
}

/// Keys documents as `doc-{id}` and locks them as `doc-lock-{id}`.
#[derive(Debug, Clone)]
pub struct DocumentConfig {
    servers: ServerPairings,
    ttl: u32,
    lock_ttl: u32,
}

impl DocumentConfig {
    pub fn new(servers: ServerPairings, ttl: u32, lock_ttl: u32) -> Self {
        Self {
            servers,
            ttl,
            lock_ttl,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.servers.clone(), settings.default_ttl, settings.lock_ttl)
    }

    fn checked_id(document: &Document) -> Result<u64> {
        if document.id.is_default_value() {
            return Err(CacheError::InvalidFieldValue {
                field: "id".to_string(),
                value: document.id.to_string(),
            });
        }
        Ok(document.id)
    }
}

impl DriverConfig<Document> for DocumentConfig {
    fn driver(&self) -> &str {
        LOCKING_MEMCACHE_DRIVER
    }

    fn server_pairings(&self) -> &ServerPairings {
        &self.servers
    }

    fn ttl(&self) -> u32 {
        self.ttl
    }

    fn create_key(&self, document: &Document) -> Result<String> {
        Ok(format!("doc-{}", Self::checked_id(document)?))
    }

    fn create_lock_key(&self, document: &Document) -> Result<String> {
        Ok(format!("doc-lock-{}", Self::checked_id(document)?))
    }

    fn create_lock_payload(&self, document: &Document) -> LockPayload {
        LockPayload::from([
            ("document".to_string(), document.id.to_string()),
            ("pid".to_string(), std::process::id().to_string()),
        ])
    }

    fn lock_ttl(&self, _document: &Document) -> u32 {
        self.lock_ttl
    }
}
