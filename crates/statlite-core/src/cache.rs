//! In-memory key-value cache with per-entry TTL.
//!
//! The daily salt lives here rather than in the database: it is an ephemeral
//! secret that must vanish on its own after expiry and must never be
//! persisted or logged. The trait keeps the storage pluggable (a shared
//! cache store could back it in a multi-process deployment).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Minimal TTL cache contract: `get` returns `None` once an entry expires.
pub trait TtlCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String, ttl: Duration);
}

/// Process-local `TtlCache` backed by a mutexed `HashMap`.
///
/// Expired entries are dropped lazily on the next `get` for the same key;
/// with day-keyed salts the map holds at most a couple of live entries, so
/// no sweeper task is needed.
#[derive(Default)]
pub struct InMemoryTtlCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl InMemoryTtlCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TtlCache for InMemoryTtlCache {
    fn get(&self, key: &str) -> Option<String> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        match entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => Some(value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.insert(key.to_string(), (value, Instant::now() + ttl));
    }
}
