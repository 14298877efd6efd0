//! Result cache: fingerprint -> successful response.
//!
//! The empty fingerprint is the "do not cache" sentinel: lookups with it
//! always miss and writes with it are dropped. Invalidation is wholesale;
//! there is no per-key eviction and no expiry in this layer.
//!
//! Two backends:
//! - [`MemoryCache`]: unbounded, `DashMap`-backed
//! - [`BoundedCache`]: capacity-bounded, `quick_cache`-backed
//!
//! A clear racing a concurrent `put` may leave that one entry behind or not;
//! other keys are unaffected either way.

use bytes::Bytes;
use dashmap::DashMap;
use relaycall_core::{Fingerprint, Headers};

use crate::execute::RawResponse;

/// A cached successful response, enough to rebuild the typed result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

impl From<&RawResponse> for CachedResponse {
    fn from(raw: &RawResponse) -> Self {
        Self {
            status: raw.status,
            headers: raw.headers.clone(),
            body: raw.body.clone(),
        }
    }
}

/// Shared result cache.
pub trait ResultCache: Send + Sync {
    /// Cached response for `key`. Always `None` for the empty key.
    fn get(&self, key: &Fingerprint) -> Option<CachedResponse>;

    /// Stores `value` under `key`. Ignored for the empty key.
    fn put(&self, key: &Fingerprint, value: CachedResponse);

    /// Drops every entry.
    fn invalidate_all(&self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// MemoryCache
// ---------------------------------------------------------------------------

/// Unbounded in-memory cache backed by [`DashMap`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: DashMap<Fingerprint, CachedResponse>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl ResultCache for MemoryCache {
    fn get(&self, key: &Fingerprint) -> Option<CachedResponse> {
        if key.is_empty() {
            return None;
        }
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn put(&self, key: &Fingerprint, value: CachedResponse) {
        if key.is_empty() {
            return;
        }
        self.entries.insert(key.clone(), value);
    }

    fn invalidate_all(&self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

// ---------------------------------------------------------------------------
// BoundedCache
// ---------------------------------------------------------------------------

/// Capacity-bounded cache backed by `quick_cache`. Entries beyond capacity
/// are evicted by the backend's replacement policy.
pub struct BoundedCache {
    entries: quick_cache::sync::Cache<Fingerprint, CachedResponse>,
}

impl BoundedCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: quick_cache::sync::Cache::new(capacity.max(1)),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> u64 {
        self.entries.capacity()
    }
}

impl std::fmt::Debug for BoundedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedCache")
            .field("len", &self.entries.len())
            .field("capacity", &self.entries.capacity())
            .finish()
    }
}

impl ResultCache for BoundedCache {
    fn get(&self, key: &Fingerprint) -> Option<CachedResponse> {
        if key.is_empty() {
            return None;
        }
        self.entries.get(key)
    }

    fn put(&self, key: &Fingerprint, value: CachedResponse) {
        if key.is_empty() {
            return;
        }
        self.entries.insert(key.clone(), value);
    }

    fn invalidate_all(&self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
