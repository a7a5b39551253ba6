//! Result cache: a TTL-keyed in-memory cache over fully materialized search responses.
//!
//! Keys are built from `raw_query || "::" || filter_repr || "::" || variant` and hashed with
//! BLAKE3 so the underlying [`moka`] map stores fixed-size keys regardless of query length.
//! Entries expire on [`moka::sync::Cache`]'s own `time_to_live` clock; a miss is returned for
//! both "never inserted" and "expired", and callers never observe the difference.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;

use crate::hashing::hash_prompt;

pub mod types;

pub use types::{
    ResultCacheStatus, SEARCH_STATUS_ERROR, SEARCH_STATUS_HEADER, SEARCH_STATUS_HIT,
    SEARCH_STATUS_MISS, SEARCH_STATUS_NOT_READY, SEARCH_STATUS_READY,
};

/// Builds the canonical cache key for a query, optional filter, and ranking variant.
///
/// `filter_repr` should be a stable textual representation of whatever metadata filter was
/// applied (e.g. `"feature=login"`, or the empty string when no filter was given).
#[inline]
pub fn canonical_key(raw_query: &str, filter_repr: &str, variant: &str) -> String {
    format!("{raw_query}::{filter_repr}::{variant}")
}

/// Result of a cache lookup.
#[derive(Debug, Clone)]
pub enum ResultCacheLookup {
    /// A fresh (non-expired) entry was found.
    Hit(Arc<[u8]>),
    /// No entry, or the entry was found but stale/expired.
    Miss,
}

impl ResultCacheLookup {
    /// Returns the cached bytes if this was a hit.
    pub fn into_bytes(self) -> Option<Arc<[u8]>> {
        match self {
            ResultCacheLookup::Hit(bytes) => Some(bytes),
            ResultCacheLookup::Miss => None,
        }
    }

    /// Returns the [`ResultCacheStatus`] for this lookup.
    pub fn status(&self) -> ResultCacheStatus {
        match self {
            ResultCacheLookup::Hit(_) => ResultCacheStatus::Hit,
            ResultCacheLookup::Miss => ResultCacheStatus::Miss,
        }
    }
}

/// TTL-based result cache shared across request handlers.
///
/// Cloning a [`ResultCache`] is cheap; the underlying [`moka::sync::Cache`] is itself
/// reference-counted and safe to share across concurrent requests without external locking.
#[derive(Clone)]
pub struct ResultCache {
    entries: Cache<[u8; 32], Arc<[u8]>>,
    ttl: Duration,
}

impl ResultCache {
    /// Creates a cache whose entries expire `ttl` after insertion.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Cache::builder().time_to_live(ttl).build(),
            ttl,
        }
    }

    /// The configured time-to-live for new entries.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Looks up a previously cached response for `key`.
    ///
    /// A corrupt or structurally invalid stored value is the caller's concern (deserialize on
    /// read); this layer only answers "do we have fresh bytes for this key".
    pub fn get(&self, key: &str) -> ResultCacheLookup {
        let hash = hash_prompt(key);
        match self.entries.get(&hash) {
            Some(bytes) => ResultCacheLookup::Hit(bytes),
            None => ResultCacheLookup::Miss,
        }
    }

    /// Stores `value` under `key`, overwriting any existing entry unconditionally.
    pub fn set(&self, key: &str, value: impl Into<Arc<[u8]>>) {
        let hash = hash_prompt(key);
        self.entries.insert(hash, value.into());
    }

    /// Removes the entry for `key`, if any.
    pub fn invalidate(&self, key: &str) {
        let hash = hash_prompt(key);
        self.entries.invalidate(&hash);
    }

    /// Number of entries currently tracked (may include not-yet-reaped expired entries).
    pub fn len(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Returns `true` if the cache currently tracks no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.entry_count() == 0
    }

    /// Drives pending maintenance (expiration bookkeeping) synchronously; useful in tests.
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("entries", &self.entries.entry_count())
            .field("ttl", &self.ttl)
            .finish()
    }
}
