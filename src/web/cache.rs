//! Per-`(url, query)` TTL cache for page extracts.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::PageExtract;

type Key = (String, String);

#[derive(Debug, Clone)]
struct CacheEntry {
    value: PageExtract,
    inserted_at: Instant,
}

/// Result of a cache probe.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    Fresh(PageExtract),
    /// Expired, but a usable fallback if the refetch fails.
    Stale(PageExtract),
    Miss,
}

#[derive(Debug)]
pub struct WebCache {
    entries: Mutex<HashMap<Key, CacheEntry>>,
    ttl: Duration,
}

impl WebCache {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: Mutex::new(HashMap::new()), ttl }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Key, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get_at(&self, url: &str, query: &str, now: Instant) -> CacheLookup {
        let map = self.lock();
        match map.get(&(url.to_string(), query.to_string())) {
            Some(entry) if now.saturating_duration_since(entry.inserted_at) <= self.ttl => {
                CacheLookup::Fresh(entry.value.clone())
            }
            Some(entry) if !entry.value.is_failed() => CacheLookup::Stale(entry.value.clone()),
            _ => CacheLookup::Miss,
        }
    }

    pub fn put_at(&self, url: &str, query: &str, value: PageExtract, now: Instant) {
        self.lock().insert(
            (url.to_string(), query.to_string()),
            CacheEntry { value, inserted_at: now },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(text: &str) -> PageExtract {
        PageExtract::Found { url: "u".into(), title: "t".into(), sections: vec![text.into()] }
    }

    #[test]
    fn fresh_within_ttl() {
        let cache = WebCache::new(Duration::from_secs(300));
        let t0 = Instant::now();
        cache.put_at("u", "q", found("a"), t0);
        assert_eq!(cache.get_at("u", "q", t0 + Duration::from_secs(300)), CacheLookup::Fresh(found("a")));
    }

    #[test]
    fn expired_success_is_stale() {
        let cache = WebCache::new(Duration::from_secs(300));
        let t0 = Instant::now();
        cache.put_at("u", "q", found("a"), t0);
        assert_eq!(cache.get_at("u", "q", t0 + Duration::from_secs(301)), CacheLookup::Stale(found("a")));
    }

    #[test]
    fn expired_failure_is_miss() {
        let cache = WebCache::new(Duration::from_secs(300));
        let t0 = Instant::now();
        let failed = PageExtract::Failed { url: "u".into(), reason: "timeout".into() };
        cache.put_at("u", "q", failed.clone(), t0);
        assert_eq!(cache.get_at("u", "q", t0), CacheLookup::Fresh(failed));
        assert_eq!(cache.get_at("u", "q", t0 + Duration::from_secs(301)), CacheLookup::Miss);
    }

    #[test]
    fn keys_include_query() {
        let cache = WebCache::new(Duration::from_secs(300));
        let t0 = Instant::now();
        cache.put_at("u", "q1", found("a"), t0);
        assert_eq!(cache.get_at("u", "q2", t0), CacheLookup::Miss);
        assert_eq!(cache.get_at("u", "q1", t0), CacheLookup::Fresh(found("a")));
    }
}
