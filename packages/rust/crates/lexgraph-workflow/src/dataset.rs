//! Local datasets: a graph snapshot plus document chunks in one JSON file.
//!
//! ```json
//! {
//!   "contracts": [{"id": "c1", "parties": [...], "clauses": [...], "risks": [...]}],
//!   "chunks": [{"id": "c1#0", "contract_id": "c1", "text": "..."}]
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use lexgraph_graph::{GraphSnapshot, InMemoryGraphStore};
use lexgraph_retrieval::{Chunk, InMemoryVectorIndex};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DatasetError;

/// Graph snapshot and chunks for the in-memory backends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Contract graph.
    #[serde(flatten)]
    pub graph: GraphSnapshot,
    /// Document chunks for semantic search.
    #[serde(default)]
    pub chunks: Vec<Chunk>,
}

/// Backends seeded from a [`Dataset`].
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    /// Graph store.
    pub graph: Arc<InMemoryGraphStore>,
    /// Vector index.
    pub vector: Arc<InMemoryVectorIndex>,
}

impl Dataset {
    /// Parse from JSON text.
    ///
    /// # Errors
    ///
    /// [`DatasetError::Parse`] on malformed JSON.
    pub fn from_json(raw: &str) -> Result<Self, DatasetError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Read and parse a dataset file.
    ///
    /// # Errors
    ///
    /// [`DatasetError::Io`] or [`DatasetError::Parse`].
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let raw = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// Seed fresh in-memory backends.
    ///
    /// # Errors
    ///
    /// [`DatasetError::Graph`] when a graph record cannot be written.
    pub async fn load(&self) -> Result<LoadedDataset, DatasetError> {
        let graph = self.graph.into_store().await?;
        let vector = InMemoryVectorIndex::new();
        vector.extend(self.chunks.iter().cloned()).await;
        info!(
            event = "workflow.dataset.loaded",
            contracts = self.graph.contracts.len(),
            chunks = self.chunks.len(),
            "dataset loaded"
        );
        Ok(LoadedDataset {
            graph: Arc::new(graph),
            vector: Arc::new(vector),
        })
    }
}
