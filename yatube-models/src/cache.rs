//! Short-lived cache for rendered pages.

use crate::Result;
use moka::{sync::Cache as MokaCache, Expiry};
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

/// A cached response body, with the time it is allowed to live.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub body: Arc<Vec<u8>>,
    pub ttl: Duration,
}

pub trait CacheStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Arc<Vec<u8>>>;

    fn set(&self, key: String, value: Vec<u8>, ttl: Duration);

    /// Drops every entry.
    fn clear(&self);
}

struct EntryTtl;

impl Expiry<String, CachedEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process store, backed by moka.
pub struct MemoryStore {
    inner: MokaCache<String, CachedEntry>,
}

impl MemoryStore {
    pub fn new(max_capacity: u64) -> Self {
        MemoryStore {
            inner: MokaCache::builder()
                .max_capacity(max_capacity)
                .expire_after(EntryTtl)
                .build(),
        }
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        self.inner.get(key).map(|entry| entry.body)
    }

    fn set(&self, key: String, value: Vec<u8>, ttl: Duration) {
        self.inner.insert(
            key,
            CachedEntry {
                body: Arc::new(value),
                ttl,
            },
        );
    }

    fn clear(&self) {
        self.inner.invalidate_all();
    }
}

/// Caches whole pages under their request URI for a fixed time.
///
/// Nothing invalidates an entry before it expires except `clear`.
pub struct PageCache {
    store: Box<dyn CacheStore>,
    ttl: Duration,
}

impl PageCache {
    pub fn new(store: Box<dyn CacheStore>, ttl: Duration) -> Self {
        PageCache { store, ttl }
    }

    pub fn in_memory(ttl: Duration) -> Self {
        PageCache::new(Box::new(MemoryStore::new(1_000)), ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached body for `key`, or renders, stores and returns a new one.
    ///
    /// Failed renders are not cached.
    pub fn get_or_render<F>(&self, key: &str, render: F) -> Result<Arc<Vec<u8>>>
    where
        F: FnOnce() -> Result<Vec<u8>>,
    {
        if let Some(body) = self.store.get(key) {
            debug!("Page cache hit for {}", key);
            return Ok(body);
        }
        let body = render()?;
        self.store.set(key.to_owned(), body.clone(), self.ttl);
        Ok(Arc::new(body))
    }

    pub fn clear(&self) {
        info!("Clearing the page cache");
        self.store.clear();
    }
}
