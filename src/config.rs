//! Configuration Module
//!
//! Handles loading process settings from environment variables and parsing
//! the memcache server list.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{CacheError, Result};

// == Server Pairings ==
/// Ordered list of `host:port` pairs a driver registers with its client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerPairings {
    pairs: Vec<(String, u16)>,
}

impl ServerPairings {
    /// Creates an empty pairing list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pairing, keeping insertion order. A host already present is
    /// updated in place.
    pub fn with(mut self, host: impl Into<String>, port: u16) -> Self {
        let host = host.into();
        match self.pairs.iter_mut().find(|(h, _)| *h == host) {
            Some(pair) => pair.1 = port,
            None => self.pairs.push((host, port)),
        }
        self
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u16)> {
        self.pairs.iter().map(|(h, p)| (h.as_str(), *p))
    }
}

impl FromStr for ServerPairings {
    type Err = CacheError;

    /// Parses `"host:port,host:port"`. Blank input yields an empty list.
    fn from_str(s: &str) -> Result<Self> {
        let mut pairings = ServerPairings::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (host, port) = entry
                .rsplit_once(':')
                .ok_or_else(|| CacheError::InvalidServerPairing(entry.to_string()))?;
            if host.is_empty() {
                return Err(CacheError::InvalidServerPairing(entry.to_string()));
            }
            let port: u16 = port
                .parse()
                .map_err(|_| CacheError::InvalidServerPairing(entry.to_string()))?;
            pairings = pairings.with(host, port);
        }
        Ok(pairings)
    }
}

impl fmt::Display for ServerPairings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.iter().map(|(h, p)| format!("{}:{}", h, p)).collect();
        write!(f, "{}", joined.join(","))
    }
}

// == Settings ==
/// Process configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Memcache servers the document cache connects to
    pub servers: ServerPairings,
    /// Default TTL in seconds for cached entries, 0 = never expire.
    ///
    /// Always relative; TTLs over 30 days are sent to memcached as an
    /// absolute timestamp.
    pub default_ttl: u32,
    /// TTL in seconds for lock records
    pub lock_ttl: u32,
    /// TCP connect timeout for each memcache server
    pub connect_timeout: Duration,
    /// Read/write timeout on an established memcache socket
    pub io_timeout: Duration,
    /// HTTP server port
    pub server_port: u16,
    /// Use the in-memory store instead of memcache
    pub mock_drivers: bool,
    /// Interval in seconds between in-memory store purges
    pub cleanup_interval: u64,
}

impl Settings {
    /// Creates Settings by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_SERVERS` - Comma separated `host:port` list (default: 127.0.0.1:11211)
    /// - `CACHE_TTL` - Entry TTL in seconds (default: 3600)
    /// - `CACHE_LOCK_TTL` - Lock TTL in seconds (default: 1)
    /// - `CONNECT_TIMEOUT_MS` - Connect timeout (default: 500)
    /// - `IO_TIMEOUT_MS` - Socket read/write timeout (default: 1000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `MOCK_DRIVERS` - `true`/`1` to use the in-memory store (default: false)
    /// - `CLEANUP_INTERVAL` - Purge frequency in seconds (default: 60)
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Same as [`Settings::from_env`], reading from an arbitrary lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parsed = |name: &str| lookup(name).and_then(|v| v.trim().parse::<u64>().ok());

        let servers = match lookup("CACHE_SERVERS") {
            Some(raw) => raw.parse()?,
            None => defaults.servers,
        };

        Ok(Self {
            servers,
            default_ttl: parsed("CACHE_TTL")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.default_ttl),
            lock_ttl: parsed("CACHE_LOCK_TTL")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.lock_ttl),
            connect_timeout: parsed("CONNECT_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.connect_timeout),
            io_timeout: parsed("IO_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.io_timeout),
            server_port: parsed("SERVER_PORT")
                .and_then(|v| u16::try_from(v).ok())
                .unwrap_or(defaults.server_port),
            mock_drivers: lookup("MOCK_DRIVERS")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.mock_drivers),
            cleanup_interval: parsed("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            servers: ServerPairings::new().with("127.0.0.1", 11211),
            default_ttl: 3600,
            lock_ttl: 1,
            connect_timeout: Duration::from_millis(500),
            io_timeout: Duration::from_millis(1000),
            server_port: 3000,
            mock_drivers: false,
            cleanup_interval: 60,
        }
    }
}
