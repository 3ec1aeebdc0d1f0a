//! Memcache Client Module
//!
//! Blocking memcache text-protocol client over `std::net::TcpStream`.
//!
//! # Commands
//! - `add` / `set`: `<cmd> <key> <flags> <exptime> <bytes>\r\n<data>\r\n`
//!   -> `STORED` | `NOT_STORED`
//! - `get`: `get <key>\r\n` -> `VALUE <key> <flags> <bytes>\r\n<data>\r\nEND\r\n` | `END\r\n`
//! - `delete`: `delete <key>\r\n` -> `DELETED` | `NOT_FOUND`
//! - `incr`: `incr <key> <step>\r\n` -> `<value>` | `NOT_FOUND`
//! - `version`: `version\r\n` -> `VERSION <text>`

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::{CacheError, Result};
use crate::store::{
    validate_key, validate_value, StoreClient, MAX_RELATIVE_TTL, MAX_VALUE_SIZE,
};

// == Server ==
/// A registered server and its lazily opened socket.
#[derive(Debug)]
struct Server {
    host: String,
    port: u16,
    stream: Option<BufReader<TcpStream>>,
}

impl Server {
    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn open(&self, connect_timeout: Duration, io_timeout: Duration) -> Result<TcpStream> {
        let addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| CacheError::Connection(format!("{}: {}", self.address(), e)))?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, connect_timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(io_timeout))?;
                    stream.set_write_timeout(Some(io_timeout))?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => last_error = Some(e),
            }
        }

        Err(CacheError::Connection(match last_error {
            Some(e) => format!("{}: {}", self.address(), e),
            None => format!("{}: no addresses resolved", self.address()),
        }))
    }
}

// == Memcache Client ==
/// Memcache client spreading keys over the registered servers.
///
/// A key always maps to the same server for a given server list, in every
/// process, so lock keys contend on one node.
#[derive(Debug)]
pub struct MemcacheClient {
    servers: Vec<Server>,
    connect_timeout: Duration,
    io_timeout: Duration,
}

impl MemcacheClient {
    /// Creates a client with no servers and the given timeouts.
    pub fn new(connect_timeout: Duration, io_timeout: Duration) -> Self {
        Self {
            servers: Vec::new(),
            connect_timeout,
            io_timeout,
        }
    }

    /// Creates a client using the timeouts from `settings`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.connect_timeout, settings.io_timeout)
    }

    pub fn server_count(&self) -> usize {
        self.servers.len()
    }

    fn server_index(&self, key: &str) -> Result<usize> {
        if self.servers.is_empty() {
            return Err(CacheError::Connection("no servers registered".to_string()));
        }
        Ok(select_server(key, self.servers.len()))
    }

    /// Runs one request/response exchange against server `index`, opening the
    /// socket if needed. Any failure drops the socket so the next call starts
    /// from a clean stream.
    fn exchange<T>(
        &mut self,
        index: usize,
        request: &[u8],
        read_reply: impl FnOnce(&mut BufReader<TcpStream>) -> Result<T>,
    ) -> Result<T> {
        let (connect_timeout, io_timeout) = (self.connect_timeout, self.io_timeout);
        let server = &mut self.servers[index];

        if server.stream.is_none() {
            debug!(server = %server.address(), "opening memcache connection");
            server.stream = Some(BufReader::new(server.open(connect_timeout, io_timeout)?));
        }

        let result = match server.stream.as_mut() {
            Some(stream) => stream
                .get_mut()
                .write_all(request)
                .map_err(CacheError::from)
                .and_then(|_| read_reply(stream)),
            None => Err(CacheError::Internal("memcache stream missing".to_string())),
        };

        if let Err(e) = &result {
            warn!(server = %server.address(), error = %e, "dropping memcache connection");
            server.stream = None;
        }
        result
    }

    fn store(
        &mut self,
        command: &str,
        key: &str,
        value: &[u8],
        flags: u32,
        ttl: u32,
    ) -> Result<bool> {
        validate_key(key)?;
        validate_value(value)?;
        let index = self.server_index(key)?;

        let exptime = wire_exptime(ttl, chrono::Utc::now().timestamp());
        let mut request =
            format!("{} {} {} {} {}\r\n", command, key, flags, exptime, value.len()).into_bytes();
        request.extend_from_slice(value);
        request.extend_from_slice(b"\r\n");

        self.exchange(index, &request, |stream| {
            parse_storage_reply(&read_line(stream)?)
        })
    }
}

impl StoreClient for MemcacheClient {
    fn add_server(&mut self, host: &str, port: u16) {
        if self.servers.iter().any(|s| s.host == host && s.port == port) {
            return;
        }
        self.servers.push(Server {
            host: host.to_string(),
            port,
            stream: None,
        });
    }

    fn add(&mut self, key: &str, value: &[u8], flags: u32, ttl: u32) -> Result<bool> {
        self.store("add", key, value, flags, ttl)
    }

    fn set(&mut self, key: &str, value: &[u8], flags: u32, ttl: u32) -> Result<bool> {
        self.store("set", key, value, flags, ttl)
    }

    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        let index = self.server_index(key)?;
        let request = format!("get {}\r\n", key).into_bytes();

        self.exchange(index, &request, |stream| {
            let Some(len) = parse_value_header(&read_line(stream)?)? else {
                return Ok(None);
            };

            let block = len
                .checked_add(2)
                .ok_or_else(|| CacheError::Protocol(format!("value length {} overflows", len)))?;
            let mut data = vec![0u8; block];
            stream.read_exact(&mut data)?;
            if !data.ends_with(b"\r\n") {
                return Err(CacheError::Protocol("value block not terminated".to_string()));
            }
            data.truncate(len);

            let end = read_line(stream)?;
            if end != b"END" {
                return Err(CacheError::Protocol(format!(
                    "expected END, got {:?}",
                    String::from_utf8_lossy(&end)
                )));
            }
            Ok(Some(data))
        })
    }

    fn delete(&mut self, key: &str) -> Result<bool> {
        validate_key(key)?;
        let index = self.server_index(key)?;
        let request = format!("delete {}\r\n", key).into_bytes();

        self.exchange(index, &request, |stream| {
            parse_delete_reply(&read_line(stream)?)
        })
    }

    fn increment(&mut self, key: &str, step: u64) -> Result<Option<u64>> {
        validate_key(key)?;
        let index = self.server_index(key)?;
        let request = format!("incr {} {}\r\n", key, step).into_bytes();

        self.exchange(index, &request, |stream| {
            parse_incr_reply(&read_line(stream)?)
        })
    }

    fn version(&mut self) -> Result<Option<String>> {
        if self.servers.is_empty() {
            return Ok(None);
        }

        self.exchange(0, b"version\r\n", |stream| {
            parse_version_reply(&read_line(stream)?).map(Some)
        })
    }
}

// == Server Selection ==
/// Maps a key onto one of `count` servers using a stable hash.
pub fn select_server(key: &str, count: usize) -> usize {
    let digest = Sha256::digest(key.as_bytes());
    let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    prefix as usize % count
}

/// Converts a relative TTL into the exptime memcached expects.
///
/// memcached treats anything above 30 days as an absolute Unix timestamp, so
/// longer TTLs are sent as `now + ttl`.
fn wire_exptime(ttl: u32, now_secs: i64) -> u64 {
    if ttl <= MAX_RELATIVE_TTL {
        return u64::from(ttl);
    }
    u64::try_from(now_secs).unwrap_or(0) + u64::from(ttl)
}

// == Reply Parsing ==
/// Reads one `\r\n` terminated line, without the terminator.
fn read_line(stream: &mut impl BufRead) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    let read = stream.read_until(b'\n', &mut line)?;
    if read == 0 {
        return Err(CacheError::Connection("connection closed by server".to_string()));
    }
    if !line.ends_with(b"\r\n") {
        return Err(CacheError::Protocol("reply line not terminated".to_string()));
    }
    line.truncate(line.len() - 2);
    Ok(line)
}

/// Turns `ERROR`, `CLIENT_ERROR ..` and `SERVER_ERROR ..` into protocol errors.
fn check_error(line: &[u8]) -> Result<()> {
    if line == b"ERROR" || line.starts_with(b"CLIENT_ERROR") || line.starts_with(b"SERVER_ERROR") {
        return Err(CacheError::Protocol(
            String::from_utf8_lossy(line).into_owned(),
        ));
    }
    Ok(())
}

fn unexpected(line: &[u8]) -> CacheError {
    CacheError::Protocol(format!(
        "unexpected reply: {:?}",
        String::from_utf8_lossy(line)
    ))
}

fn parse_storage_reply(line: &[u8]) -> Result<bool> {
    check_error(line)?;
    match line {
        b"STORED" => Ok(true),
        b"NOT_STORED" | b"EXISTS" => Ok(false),
        _ => Err(unexpected(line)),
    }
}

fn parse_delete_reply(line: &[u8]) -> Result<bool> {
    check_error(line)?;
    match line {
        b"DELETED" => Ok(true),
        b"NOT_FOUND" => Ok(false),
        _ => Err(unexpected(line)),
    }
}

fn parse_incr_reply(line: &[u8]) -> Result<Option<u64>> {
    check_error(line)?;
    if line == b"NOT_FOUND" {
        return Ok(None);
    }
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .map(Some)
        .ok_or_else(|| unexpected(line))
}

/// Parses `VALUE <key> <flags> <bytes>` into the data length, or `None` for `END`.
///
/// Lengths above [`MAX_VALUE_SIZE`] are rejected before anything is allocated.
fn parse_value_header(line: &[u8]) -> Result<Option<usize>> {
    check_error(line)?;
    if line == b"END" {
        return Ok(None);
    }

    let text = std::str::from_utf8(line).map_err(|_| unexpected(line))?;
    let parts: Vec<&str> = text.split_ascii_whitespace().collect();
    let len: usize = match parts.as_slice() {
        ["VALUE", _key, _flags, bytes, ..] => bytes.parse().map_err(|_| unexpected(line))?,
        _ => return Err(unexpected(line)),
    };

    if len > MAX_VALUE_SIZE {
        return Err(CacheError::Protocol(format!(
            "value length {} exceeds maximum of {} bytes",
            len, MAX_VALUE_SIZE
        )));
    }
    Ok(Some(len))
}

fn parse_version_reply(line: &[u8]) -> Result<String> {
    check_error(line)?;
    line.strip_prefix(b"VERSION ")
        .map(|v| String::from_utf8_lossy(v).into_owned())
        .ok_or_else(|| unexpected(line))
}
