//! Caching module for repository searches
//!
//! Session-scoped store of successful search results keyed by query.

use crate::query::Query;
use crate::results::SearchResultSet;
use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default freshness window (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// A cached search result
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub query: Query,
    pub payload: Arc<SearchResultSet>,
    pub fetched_at: Instant,
}

impl CacheEntry {
    /// Age exceeds `ttl`
    pub fn is_expired(&self, ttl: Duration) -> bool {
        Instant::now().saturating_duration_since(self.fetched_at) > ttl
    }
}

/// Cache for search results
///
/// Entries older than the TTL read as absent. moka's own time-to-live evicts
/// them physically later on.
pub struct CacheStore {
    cache: Cache<String, CacheEntry>,
    ttl: Duration,
}

impl CacheStore {
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_capacity)
            .build();

        Self { cache, ttl }
    }

    /// Get a fresh entry for `query`
    pub fn get(&self, query: &Query) -> Option<CacheEntry> {
        let entry = self.cache.get(&query.cache_key())?;
        if entry.is_expired(self.ttl) {
            debug!("Cache entry for '{}' expired", query);
            return None;
        }
        Some(entry)
    }

    /// Store or overwrite the entry for `query`, stamped now
    pub fn put(&self, query: &Query, payload: Arc<SearchResultSet>) {
        let entry = CacheEntry {
            query: query.clone(),
            payload,
            fetched_at: Instant::now(),
        };
        self.cache.insert(query.cache_key(), entry);
    }

    /// Clear the entire cache
    pub fn clear(&self) {
        self.cache.invalidate_all();
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, 1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{build, SearchCriteria};
    use crate::results::fixtures::result_set;

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = CacheStore::default();
        let query = build(&SearchCriteria::language("Rust"));
        let payload = Arc::new(result_set(&["tokio", "serde"]));

        cache.put(&query, payload.clone());

        let entry = cache.get(&query).expect("fresh entry");
        assert_eq!(entry.query, query);
        assert_eq!(entry.payload, payload);
    }

    #[tokio::test]
    async fn test_miss_for_unknown_query() {
        let cache = CacheStore::default();
        assert!(cache.get(&build(&SearchCriteria::term("nothing"))).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expires_after_ttl() {
        let cache = CacheStore::new(Duration::from_secs(300), 100);
        let query = build(&SearchCriteria::language("Go"));
        cache.put(&query, Arc::new(result_set(&["hugo"])));

        tokio::time::advance(Duration::from_secs(300)).await;
        assert!(cache.get(&query).is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get(&query).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_overwrites_and_restamps() {
        let cache = CacheStore::new(Duration::from_secs(60), 100);
        let query = build(&SearchCriteria::term("parser"));
        cache.put(&query, Arc::new(result_set(&["nom"])));

        tokio::time::advance(Duration::from_secs(50)).await;
        cache.put(&query, Arc::new(result_set(&["pest", "nom"])));

        tokio::time::advance(Duration::from_secs(50)).await;
        let entry = cache.get(&query).expect("restamped entry");
        assert_eq!(entry.payload.len(), 2);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = CacheStore::default();
        let query = build(&SearchCriteria::language("Rust"));
        cache.put(&query, Arc::new(result_set(&["tokio"])));

        cache.clear();
        assert!(cache.get(&query).is_none());
    }
}
