//! A small memcached stand-in speaking the text protocol over TCP.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

type Items = Arc<Mutex<HashMap<String, (Vec<u8>, Option<Instant>)>>>;

pub struct FakeMemcached {
    pub port: u16,
    items: Items,
    connections: Arc<AtomicUsize>,
}

impl FakeMemcached {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let items: Items = Arc::default();
        let connections = Arc::new(AtomicUsize::new(0));

        let (accept_items, accept_connections) = (items.clone(), connections.clone());
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                accept_connections.fetch_add(1, Ordering::SeqCst);
                let items = accept_items.clone();
                thread::spawn(move || serve(stream, items));
            }
        });

        Self {
            port,
            items,
            connections,
        }
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn contains(&self, key: &str) -> bool {
        live(&self.items, key).is_some()
    }

    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        live(&self.items, key)
    }
}

fn live(items: &Items, key: &str) -> Option<Vec<u8>> {
    let mut items = items.lock().unwrap();
    let expired = matches!(items.get(key), Some((_, Some(at))) if Instant::now() >= *at);
    if expired {
        items.remove(key);
    }
    items.get(key).map(|(value, _)| value.clone())
}

/// memcached reads exptimes above 30 days as absolute Unix timestamps.
fn expiry(exptime: u64) -> Option<Instant> {
    const MAX_RELATIVE: u64 = 60 * 60 * 24 * 30;
    match exptime {
        0 => None,
        ttl if ttl <= MAX_RELATIVE => Some(Instant::now() + Duration::from_secs(ttl)),
        at => {
            let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
            Some(Instant::now() + Duration::from_secs(at.saturating_sub(now)))
        }
    }
}

fn serve(stream: TcpStream, items: Items) {
    let mut writer = stream.try_clone().unwrap();
    let mut reader = BufReader::new(stream);

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let parts: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        let reply = match parts.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            ["version"] => b"VERSION 1.6.0-fake\r\n".to_vec(),
            ["get", key] => match live(&items, key) {
                Some(value) => {
                    let mut out = format!("VALUE {} 0 {}\r\n", key, value.len()).into_bytes();
                    out.extend_from_slice(&value);
                    out.extend_from_slice(b"\r\nEND\r\n");
                    out
                }
                None => b"END\r\n".to_vec(),
            },
            [cmd @ ("set" | "add"), key, _flags, exptime, bytes] => {
                let len: usize = bytes.parse().unwrap();
                let mut data = vec![0u8; len + 2];
                reader.read_exact(&mut data).unwrap();
                data.truncate(len);

                let expires = expiry(exptime.parse().unwrap());
                let exists = live(&items, key).is_some();
                if *cmd == "add" && exists {
                    b"NOT_STORED\r\n".to_vec()
                } else {
                    items
                        .lock()
                        .unwrap()
                        .insert(key.to_string(), (data, expires));
                    b"STORED\r\n".to_vec()
                }
            }
            ["delete", key] => {
                if live(&items, key).is_some() {
                    items.lock().unwrap().remove(*key);
                    b"DELETED\r\n".to_vec()
                } else {
                    b"NOT_FOUND\r\n".to_vec()
                }
            }
            ["incr", key, step] => match live(&items, key) {
                Some(value) => {
                    let current: u64 = String::from_utf8(value).unwrap().parse().unwrap();
                    let next = current + step.parse::<u64>().unwrap();
                    let mut items = items.lock().unwrap();
                    if let Some(entry) = items.get_mut(*key) {
                        entry.0 = next.to_string().into_bytes();
                    }
                    format!("{}\r\n", next).into_bytes()
                }
                None => b"NOT_FOUND\r\n".to_vec(),
            },
            _ => b"ERROR\r\n".to_vec(),
        };

        if writer.write_all(&reply).is_err() {
            return;
        }
    }
}

/// Returns a local port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}
