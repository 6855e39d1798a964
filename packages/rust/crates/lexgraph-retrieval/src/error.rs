//! Error types for hybrid retrieval.

use thiserror::Error;

use crate::vector::VectorSearchError;

/// Which backing store failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackingStore {
    /// Embedding-similarity store.
    Vector,
    /// Property graph store.
    Graph,
}

impl std::fmt::Display for BackingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackingStore::Vector => write!(f, "vector"),
            BackingStore::Graph => write!(f, "graph"),
        }
    }
}

/// Errors raised by [`crate::HybridRetriever`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    /// Caller supplied an unusable argument; raised before any I/O.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A backing store cannot be reached. Never retried here.
    #[error("{store} store unavailable: {message}")]
    BackingStoreUnavailable {
        /// Failing store.
        store: BackingStore,
        /// Driver message.
        message: String,
    },

    /// The vector store was reached but the search failed.
    #[error("semantic search failed: {0}")]
    SemanticSearch(String),
}

impl RetrievalError {
    /// True for the "service unavailable" condition a resilience layer may retry.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::BackingStoreUnavailable { .. })
    }
}

impl From<VectorSearchError> for RetrievalError {
    fn from(error: VectorSearchError) -> Self {
        match error {
            VectorSearchError::Unavailable(message) => Self::BackingStoreUnavailable {
                store: BackingStore::Vector,
                message,
            },
            VectorSearchError::Query(message) => Self::SemanticSearch(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RetrievalError;
    use crate::vector::VectorSearchError;

    #[test]
    fn test_vector_unavailable_maps_to_backing_store() {
        let error: RetrievalError = VectorSearchError::Unavailable("timeout".to_string()).into();
        assert!(error.is_unavailable());
        assert_eq!(error.to_string(), "vector store unavailable: timeout");

        let error: RetrievalError = VectorSearchError::Query("bad filter".to_string()).into();
        assert!(!error.is_unavailable());
    }
}
