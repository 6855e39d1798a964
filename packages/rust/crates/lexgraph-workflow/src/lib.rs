//! lexgraph-workflow - GraphRAG answering over hybrid contract retrieval.
//!
//! Module layout:
//! - `format`: cited context blocks, citation sources, token budget, prompt
//! - `complexity`: question complexity heuristic (model tier routing)
//! - `llm`: `LlmGenerator` seam and OpenAI-compatible client
//! - `workflow`: `GraphRagWorkflow`
//! - `dataset`: JSON datasets for the in-memory backends

mod complexity;
mod dataset;
mod error;
mod format;
mod llm;
mod workflow;

pub use complexity::{QueryComplexity, classify_complexity};
pub use dataset::{Dataset, LoadedDataset};
pub use error::{DatasetError, LlmError, WorkflowError};
pub use format::{Source, build_prompt, extract_sources, format_context, truncate_to_token_budget};
pub use llm::{
    ChatCompletionClient, Generation, LITELLM_DEFAULT_URL, LlmClientConfig, LlmGenerator, ModelTier,
};
pub use workflow::{AnswerOptions, GraphRagAnswer, GraphRagWorkflow, NO_RELEVANT_INFORMATION};
