//! Error types for answering and dataset loading.

use std::path::PathBuf;

use lexgraph_graph::GraphError;
use lexgraph_retrieval::RetrievalError;
use thiserror::Error;

/// Errors raised by an [`crate::LlmGenerator`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// Endpoint unreachable, timed out, rate limited or returning 5xx.
    #[error("llm endpoint unavailable: {0}")]
    Unavailable(String),

    /// Endpoint rejected the request.
    #[error("llm request failed: {0}")]
    Request(String),

    /// Response body could not be understood.
    #[error("llm response invalid: {0}")]
    Response(String),
}

impl LlmError {
    /// True for the "service unavailable" condition a resilience layer may retry.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Errors raised by [`crate::GraphRagWorkflow`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorkflowError {
    /// Blank question; raised before any I/O.
    #[error("invalid question: {0}")]
    InvalidQuestion(String),

    /// Retrieval failed.
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    /// Generation failed.
    #[error(transparent)]
    Generation(#[from] LlmError),
}

impl WorkflowError {
    /// True when any collaborator reported the "service unavailable" condition.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::InvalidQuestion(_) => false,
            Self::Retrieval(error) => error.is_unavailable(),
            Self::Generation(error) => error.is_unavailable(),
        }
    }
}

/// Errors raised while loading a dataset file.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// File could not be read.
    #[error("failed to read dataset {path}: {source}")]
    Io {
        /// Dataset path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// File is not a valid dataset document.
    #[error("failed to parse dataset: {0}")]
    Parse(#[from] serde_json::Error),

    /// A graph record could not be written (blank id, dangling clause reference).
    #[error(transparent)]
    Graph(#[from] GraphError),
}
