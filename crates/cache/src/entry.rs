// crates/cache/src/entry.rs
//! Cached values and their expiry

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<T> {
    pub(crate) data: T,
    pub(crate) inserted_at: Instant,
    pub(crate) ttl: Duration,
}

impl<T> CacheEntry<T> {
    pub(crate) fn new(data: T, ttl: Duration) -> Self {
        Self {
            data,
            inserted_at: Instant::now(),
            ttl,
        }
    }

    /// Live while `now - inserted_at < ttl`
    pub(crate) fn is_live(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) < self.ttl
    }
}
