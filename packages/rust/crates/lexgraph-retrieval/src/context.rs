//! Process-wide retrieval context: store handles plus resolved configuration.
//!
//! Built once at startup and passed into constructors; there are no global
//! service handles.

use std::sync::Arc;

use lexgraph_graph::{GraphContextRetriever, GraphStore};
use tracing::info;

use crate::cache::CachedRetriever;
use crate::config::HybridRetrieverConfig;
use crate::retriever::{HybridRetriever, Retriever};
use crate::settings::{RetrievalSettings, load_retrieval_settings};
use crate::vector::VectorSearchClient;

/// Store handles and configuration shared by every retriever of a process.
#[derive(Clone)]
pub struct RetrievalContext {
    vector: Arc<dyn VectorSearchClient>,
    graph: Arc<dyn GraphStore>,
    config: HybridRetrieverConfig,
}

impl std::fmt::Debug for RetrievalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetrievalContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RetrievalContext {
    /// Context with an explicit configuration.
    #[must_use]
    pub fn new(
        vector: Arc<dyn VectorSearchClient>,
        graph: Arc<dyn GraphStore>,
        config: HybridRetrieverConfig,
    ) -> Self {
        Self {
            vector,
            graph,
            config,
        }
    }

    /// Context configured from already-loaded settings.
    #[must_use]
    pub fn from_settings(
        vector: Arc<dyn VectorSearchClient>,
        graph: Arc<dyn GraphStore>,
        settings: &RetrievalSettings,
    ) -> Self {
        Self::new(vector, graph, HybridRetrieverConfig::from_settings(settings))
    }

    /// Context configured from the system and user settings files.
    #[must_use]
    pub fn from_runtime_settings(
        vector: Arc<dyn VectorSearchClient>,
        graph: Arc<dyn GraphStore>,
    ) -> Self {
        Self::from_settings(vector, graph, &load_retrieval_settings())
    }

    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &HybridRetrieverConfig {
        &self.config
    }

    /// Graph context retriever over the shared graph store.
    #[must_use]
    pub fn graph_retriever(&self) -> GraphContextRetriever {
        GraphContextRetriever::new(Arc::clone(&self.graph))
    }

    /// Uncached hybrid retriever.
    #[must_use]
    pub fn hybrid_retriever(&self) -> HybridRetriever {
        HybridRetriever::new(
            Arc::clone(&self.vector),
            self.graph_retriever(),
            self.config.clone(),
        )
    }

    /// Hybrid retriever, wrapped in a response cache when the configuration enables one.
    #[must_use]
    pub fn retriever(&self) -> Arc<dyn Retriever> {
        let hybrid = self.hybrid_retriever();
        if self.config.cache.enabled {
            info!(
                event = "retrieval.cache.enabled",
                ttl_secs = self.config.cache.ttl.as_secs(),
                max_entries = self.config.cache.max_entries,
                "response cache enabled"
            );
            Arc::new(CachedRetriever::new(hybrid, self.config.cache))
        } else {
            Arc::new(hybrid)
        }
    }
}
