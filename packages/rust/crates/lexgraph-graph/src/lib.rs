//! lexgraph-graph - Contract property graph and graph context retrieval.
//!
//! Module layout (by domain):
//! - `model`: node labels, relationship types, nodes, edges
//! - `traversal`: read-only traversal description and result rows
//! - `store`: `GraphStore` driver seam
//! - `memory`: in-memory reference store with contract-domain writers
//! - `snapshot`: JSON snapshots for seeding the in-memory store
//! - `context` / `retriever`: graph context types and `GraphContextRetriever`
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use lexgraph_graph::{
//!     CompanyRef, ContextOptions, GraphContextRetriever, GraphError, InMemoryGraphStore,
//!     Properties,
//! };
//!
//! async fn demo() -> Result<(), GraphError> {
//!     let store = InMemoryGraphStore::new();
//!     store.add_contract("c1", Properties::new()).await?;
//!     store
//!         .link_party("c1", &CompanyRef { name: "Acme Corp".into(), role: "licensor".into() })
//!         .await?;
//!
//!     let retriever = GraphContextRetriever::new(Arc::new(store));
//!     let context = retriever
//!         .get_context_for_contract("c1", &ContextOptions::default())
//!         .await?;
//!     assert_eq!(context.map(|c| c.companies.len()), Some(1));
//!     Ok(())
//! }
//! ```

mod context;
mod error;
mod memory;
mod model;
mod retriever;
mod snapshot;
mod store;
mod traversal;

pub use context::{
    ClauseContext, ClauseInfo, CompanyRef, GraphContext, RiskContext, RiskFactor, RiskLevel,
    SimilarContract, TRAVERSAL_DEPTH,
};
pub use error::GraphError;
pub use memory::{GraphStoreStats, InMemoryGraphStore, company_node_id};
pub use model::{Direction, GraphEdge, GraphNode, NodeLabel, Properties, RelationType, str_property};
pub use retriever::{ContextOptions, DEFAULT_MAX_CLAUSES, GraphContextRetriever};
pub use snapshot::{ClauseRecord, ContractRecord, GraphSnapshot, RiskRecord};
pub use store::GraphStore;
pub use traversal::{
    Expansion, Neighbor, NodeSelector, OrderBy, PropertyFilter, Traversal, TraversalRow,
};
