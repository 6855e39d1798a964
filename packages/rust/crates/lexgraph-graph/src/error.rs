//! Error types for graph store and graph context operations.

use thiserror::Error;

/// Errors raised by graph stores and the graph context retriever.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Caller supplied an unusable argument (blank id, zero limit).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The backing graph store cannot be reached.
    #[error("graph store unavailable: {0}")]
    Unavailable(String),

    /// The store was reached but the traversal failed.
    #[error("graph query failed: {0}")]
    Query(String),

    /// An edge references a node that does not exist.
    #[error("invalid relation: source={0}, target={1}")]
    InvalidRelation(String, String),

    /// Snapshot file could not be read or parsed.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl GraphError {
    /// True for the "service unavailable" condition a resilience layer may retry.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Reject blank identifiers before any I/O happens.
pub(crate) fn require_non_blank(value: &str, what: &str) -> Result<(), GraphError> {
    if value.trim().is_empty() {
        return Err(GraphError::InvalidArgument(format!(
            "{what} must not be empty"
        )));
    }
    Ok(())
}
