//! Per-source price cache with lazy TTL expiry
//!
//! Each source adapter owns one `SourceCache`. Entries are checked for
//! staleness on read; stale entries read as absent and are overwritten by the
//! next successful put. There is no background eviction and no size bound —
//! the key space is a small fixed crop list.

use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::models::SourceQuote;

#[derive(Debug, Clone)]
struct CacheEntry {
    quote: SourceQuote,
    fetched_at: Instant,
}

/// Time-boxed memoization of source quotes keyed by (crop, state)
pub struct SourceCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
}

impl SourceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    fn key(crop: &str, state: &str) -> String {
        format!("{}|{}", crop.to_lowercase(), state.to_lowercase())
    }

    /// Get a cached quote if one exists and is still fresh
    pub fn get(&self, crop: &str, state: &str) -> Option<SourceQuote> {
        let key = Self::key(crop, state);
        let entry = self.entries.get(&key)?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(entry.quote.clone())
        } else {
            None
        }
    }

    /// Store a quote, replacing any previous entry for the pair
    pub fn put(&self, crop: &str, state: &str, quote: SourceQuote) {
        self.entries.insert(
            Self::key(crop, state),
            CacheEntry {
                quote,
                fetched_at: Instant::now(),
            },
        );
    }
}
