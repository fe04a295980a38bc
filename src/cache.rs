//! Response cache for list queries.
//!
//! Keys look like `workers?q=joao&page=2`. A mutation on a resource drops
//! every cached entry under that resource, including nested paths
//! (`events` also drops `events/3/days/9/workers?...`).
//!
//! Every invalidation bumps an epoch. A fetch that started before the bump
//! must not store its (possibly pre-mutation) response: read [`QueryCache::epoch`]
//! before the request and store through [`QueryCache::put_if_current`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;

struct CacheEntry {
    value: serde_json::Value,
    stored_at: Instant,
}

pub struct QueryCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    epoch: AtomicU64,
}

impl QueryCache {
    /// A zero `ttl` disables caching.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            epoch: AtomicU64::new(0),
        }
    }

    pub fn key(resource: &str, query: &[(String, String)]) -> String {
        if query.is_empty() {
            return resource.to_string();
        }
        let encoded: Vec<String> = query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        format!("{resource}?{}", encoded.join("&"))
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        if self.ttl.is_zero() {
            return None;
        }
        let fresh = {
            let entry = self.entries.get(key)?;
            (entry.stored_at.elapsed() < self.ttl).then(|| entry.value.clone())
        };
        if fresh.is_none() {
            self.entries.remove(key);
        }
        fresh
    }

    pub fn put(&self, key: String, value: serde_json::Value) {
        if self.ttl.is_zero() {
            return;
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Store `value` only if nothing was invalidated since `seen_epoch`.
    /// Returns `false` when the value was discarded as stale.
    pub fn put_if_current(&self, key: String, value: serde_json::Value, seen_epoch: u64) -> bool {
        if self.epoch() != seen_epoch {
            return false;
        }
        if self.ttl.is_zero() {
            return true;
        }
        self.put(key.clone(), value);
        // An invalidation may have slipped in between the check and the insert.
        if self.epoch() != seen_epoch {
            self.entries.remove(&key);
            return false;
        }
        true
    }

    /// Drop all entries for `resource` and anything nested under it.
    pub fn invalidate(&self, resource: &str) -> usize {
        // Bump before dropping so a racing `put_if_current` sees it.
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let before = self.entries.len();
        self.entries.retain(|key, _| !belongs_to(key, resource));
        let dropped = before.saturating_sub(self.entries.len());
        if dropped > 0 {
            tracing::debug!("invalidated {dropped} cached queries under {resource}");
        }
        dropped
    }

    pub fn clear(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn belongs_to(key: &str, resource: &str) -> bool {
    match key.strip_prefix(resource) {
        Some(rest) => rest.is_empty() || rest.starts_with('?') || rest.starts_with('/'),
        None => false,
    }
}
