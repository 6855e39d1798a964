//! Typed retriever configuration resolved from [`RetrievalSettings`].

use std::time::Duration;

use lexgraph_graph::DEFAULT_MAX_CLAUSES;
use tracing::warn;

use crate::flatten::ItemWeights;
use crate::fusion::DEFAULT_RRF_K;
use crate::settings::RetrievalSettings;

/// Default semantic hit cap per call.
pub const DEFAULT_N_SEMANTIC: usize = 5;
/// Default per-kind graph item cap per call.
pub const DEFAULT_N_GRAPH: usize = 3;
const DEFAULT_MAX_CONCURRENT_GRAPH_FETCHES: usize = 8;
const DEFAULT_GRAPH_FETCH_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_CACHE_TTL_SECS: u64 = 60;
const DEFAULT_CACHE_MAX_ENTRIES: usize = 256;

/// Response cache configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Wrap the retriever in a response cache.
    pub enabled: bool,
    /// Entry time-to-live.
    pub ttl: Duration,
    /// Maximum cached responses; oldest entries are evicted first.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
        }
    }
}

/// Per-instance configuration of [`crate::HybridRetriever`].
#[derive(Debug, Clone, PartialEq)]
pub struct HybridRetrieverConfig {
    /// RRF smoothing constant (> 0).
    pub rrf_k: f32,
    /// Default semantic hit cap for [`crate::RetrieveOptions`].
    pub n_semantic: usize,
    /// Default per-kind graph item cap for [`crate::RetrieveOptions`].
    pub n_graph: usize,
    /// Clause cap inside each graph traversal.
    pub max_clauses: usize,
    /// Concurrent graph fetch permits (>= 1).
    pub max_concurrent_graph_fetches: usize,
    /// Per-contract graph fetch timeout.
    pub graph_fetch_timeout: Duration,
    /// Graph item weights.
    pub weights: ItemWeights,
    /// Response cache.
    pub cache: CacheConfig,
}

impl Default for HybridRetrieverConfig {
    fn default() -> Self {
        Self {
            rrf_k: DEFAULT_RRF_K,
            n_semantic: DEFAULT_N_SEMANTIC,
            n_graph: DEFAULT_N_GRAPH,
            max_clauses: DEFAULT_MAX_CLAUSES,
            max_concurrent_graph_fetches: DEFAULT_MAX_CONCURRENT_GRAPH_FETCHES,
            graph_fetch_timeout: Duration::from_millis(DEFAULT_GRAPH_FETCH_TIMEOUT_MS),
            weights: ItemWeights::default(),
            cache: CacheConfig::default(),
        }
    }
}

/// Keep a weight inside `[0, 1]`, falling back to `default` otherwise.
fn weight(name: &str, value: Option<f32>, default: f32) -> f32 {
    match value {
        Some(v) if (0.0..=1.0).contains(&v) => v,
        Some(v) => {
            warn!(weight = name, value = v, "weight outside [0, 1]; using default");
            default
        }
        None => default,
    }
}

impl HybridRetrieverConfig {
    /// Resolve settings over defaults. Out-of-range values log a warning and keep the default.
    #[must_use]
    pub fn from_settings(settings: &RetrievalSettings) -> Self {
        let defaults = Self::default();
        let section = &settings.retrieval;

        let rrf_k = match section.rrf_k {
            Some(k) if k.is_finite() && k > 0.0 => k,
            Some(k) => {
                warn!(rrf_k = k, "rrf_k must be a positive number; using default");
                defaults.rrf_k
            }
            None => defaults.rrf_k,
        };
        let max_concurrent_graph_fetches = match section.max_concurrent_graph_fetches {
            Some(0) => {
                warn!("max_concurrent_graph_fetches must be at least 1; using 1");
                1
            }
            Some(n) => n,
            None => defaults.max_concurrent_graph_fetches,
        };

        let w = &settings.weights;
        let d = defaults.weights;
        let weights = ItemWeights {
            metadata: weight("metadata", w.metadata, d.metadata),
            company: weight("company", w.company, d.company),
            clause: weight("clause", w.clause, d.clause),
            risk_high: weight("risk_high", w.risk_high, d.risk_high),
            risk_medium: weight("risk_medium", w.risk_medium, d.risk_medium),
            risk_low: weight("risk_low", w.risk_low, d.risk_low),
            risk_unknown: weight("risk_unknown", w.risk_unknown, d.risk_unknown),
        };

        let cache = CacheConfig {
            enabled: settings.cache.enabled.unwrap_or(defaults.cache.enabled),
            ttl: settings
                .cache
                .ttl_secs
                .map_or(defaults.cache.ttl, Duration::from_secs),
            max_entries: settings
                .cache
                .max_entries
                .unwrap_or(defaults.cache.max_entries),
        };

        Self {
            rrf_k,
            n_semantic: section.n_semantic.unwrap_or(defaults.n_semantic),
            n_graph: section.n_graph.unwrap_or(defaults.n_graph),
            max_clauses: section.max_clauses.unwrap_or(defaults.max_clauses),
            max_concurrent_graph_fetches,
            graph_fetch_timeout: section
                .graph_fetch_timeout_ms
                .map_or(defaults.graph_fetch_timeout, Duration::from_millis),
            weights,
            cache,
        }
    }

    /// Builder: set the RRF constant.
    #[must_use]
    pub fn with_rrf_k(mut self, rrf_k: f32) -> Self {
        self.rrf_k = rrf_k;
        self
    }

    /// Builder: set the fan-out permit count (at least 1).
    #[must_use]
    pub fn with_max_concurrent_graph_fetches(mut self, permits: usize) -> Self {
        self.max_concurrent_graph_fetches = permits.max(1);
        self
    }

    /// Builder: set the per-contract graph fetch timeout.
    #[must_use]
    pub fn with_graph_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.graph_fetch_timeout = timeout;
        self
    }

    /// Builder: set the response cache.
    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}
