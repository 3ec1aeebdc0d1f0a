//! Stored Entry Module
//!
//! A single in-memory store record with memcache TTL semantics.

// == Stored Entry ==
/// Represents a single record held by the in-memory store.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    /// The stored bytes
    pub value: Vec<u8>,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl StoredEntry {
    // == Constructor ==
    /// Creates a new entry. A TTL of 0 means the entry never expires.
    pub fn new(value: Vec<u8>, ttl_seconds: u32) -> Self {
        let expires_at = match ttl_seconds {
            0 => None,
            ttl => Some(current_timestamp_ms() + u64::from(ttl) * 1000),
        };

        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches the expiration time.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}
