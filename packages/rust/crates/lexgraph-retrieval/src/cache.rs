//! Side-car response cache around a [`Retriever`].
//!
//! Keyed by (`query`, `contract_id`, `n_semantic`, `n_graph`,
//! `include_companies`, `include_risks`). Expiry is checked on lookup;
//! at capacity the oldest insertion is evicted. Errors are never cached.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use crate::config::CacheConfig;
use crate::error::RetrievalError;
use crate::retriever::{RetrieveOptions, Retriever};
use crate::types::HybridRetrievalResponse;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    query: String,
    options: RetrieveOptions,
}

impl CacheKey {
    fn new(query: &str, options: &RetrieveOptions) -> Self {
        let mut options = options.clone();
        options.contract_id = options.contract_id.map(|id| id.trim().to_string());
        Self {
            query: query.to_string(),
            options,
        }
    }
}

struct CacheEntry {
    response: HybridRetrievalResponse,
    inserted_at: Instant,
}

/// Entries plus their keys in insertion order.
///
/// With one TTL for every entry, the front of `order` is always the next to
/// expire, so evicting from the front drops expired entries before live ones.
struct ResponseCache {
    entries: HashMap<CacheKey, CacheEntry>,
    order: VecDeque<CacheKey>,
    max_entries: usize,
    ttl: Duration,
}

impl ResponseCache {
    fn new(config: &CacheConfig) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            max_entries: config.max_entries,
            ttl: config.ttl,
        }
    }

    /// Live response for `key`. An expired entry stays until overwritten or evicted.
    fn get(&self, key: &CacheKey) -> Option<HybridRetrievalResponse> {
        self.entries
            .get(key)
            .filter(|entry| entry.inserted_at.elapsed() <= self.ttl)
            .map(|entry| entry.response.clone())
    }

    fn set(&mut self, key: CacheKey, response: HybridRetrievalResponse) {
        if self.max_entries == 0 {
            return;
        }
        if self.entries.contains_key(&key) {
            self.order.retain(|k| k != &key);
        } else {
            while self.entries.len() >= self.max_entries {
                let Some(oldest) = self.order.pop_front() else {
                    break;
                };
                self.entries.remove(&oldest);
            }
        }
        let entry = CacheEntry {
            response,
            inserted_at: Instant::now(),
        };
        self.order.push_back(key.clone());
        self.entries.insert(key, entry);
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

/// Snapshot of cache behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStatsSnapshot {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that went to the inner retriever.
    pub misses: u64,
    /// Stored entries (expired entries are counted until overwritten or evicted).
    pub entries: usize,
}

/// Caches successful responses of an inner retriever.
pub struct CachedRetriever<R> {
    inner: R,
    cache: Mutex<ResponseCache>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<R> std::fmt::Debug for CachedRetriever<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedRetriever")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl<R: Retriever> CachedRetriever<R> {
    /// Wrap `inner` with a cache sized by `config` (the `enabled` flag is not consulted).
    #[must_use]
    pub fn new(inner: R, config: CacheConfig) -> Self {
        Self {
            inner,
            cache: Mutex::new(ResponseCache::new(&config)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// The wrapped retriever.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }
}

impl<R> CachedRetriever<R> {
    /// Hit/miss counters and entry count.
    pub fn stats(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.cache.lock().map_or(0, |cache| cache.entries.len()),
        }
    }
}

#[async_trait]
impl<R: Retriever> Retriever for CachedRetriever<R> {
    async fn retrieve(
        &self,
        query: &str,
        options: &RetrieveOptions,
    ) -> Result<HybridRetrievalResponse, RetrievalError> {
        let key = CacheKey::new(query, options);
        // A poisoned lock only disables caching.
        let cached = self.cache.lock().ok().and_then(|cache| cache.get(&key));
        if let Some(response) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(event = "retrieval.cache.hit", query, "response cache hit");
            return Ok(response);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(event = "retrieval.cache.miss", query, "response cache miss");

        let response = self.inner.retrieve(query, options).await?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.set(key, response.clone());
        }
        Ok(response)
    }
}
