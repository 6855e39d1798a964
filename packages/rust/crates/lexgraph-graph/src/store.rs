//! Graph store driver seam.

use async_trait::async_trait;

use crate::error::GraphError;
use crate::traversal::{Traversal, TraversalRow};

/// Read-only graph store.
///
/// Implementations translate a [`Traversal`] into their own query language.
/// `Ok(None)` means the start node did not match; it is not an error.
/// Connectivity failures must be reported as [`GraphError::Unavailable`].
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Execute one traversal.
    async fn traverse(&self, traversal: &Traversal) -> Result<Option<TraversalRow>, GraphError>;
}
