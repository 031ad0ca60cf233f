//! In-process caching built on Moka.
//!
//! Repositories and the permission checker create named caches through a
//! shared [`CacheRegistry`]; each cache is typed, LRU-bounded, and expires
//! entries by TTL so stale documents fall out without explicit
//! invalidation.

mod registry;
mod store;

use std::time::Duration;

pub use registry::CacheRegistry;
pub use store::TypedCache;

/// Sizing and expiry policy for a single named cache.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    pub capacity: u64,
    pub ttl: Option<Duration>,
    pub tti: Option<Duration>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            ttl: Some(Duration::from_secs(300)),
            tti: None,
        }
    }
}

impl CachePolicy {
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    #[must_use]
    pub fn tti(mut self, tti: Duration) -> Self {
        self.tti = Some(tti);
        self
    }
}
