//! GraphRAG answering: retrieve, budget, cite, generate.

use std::sync::Arc;

use lexgraph_retrieval::{RetrieveOptions, Retriever, estimate_tokens};
use serde::Serialize;
use tracing::{debug, info};

use crate::complexity::{QueryComplexity, classify_complexity};
use crate::error::WorkflowError;
use crate::format::{Source, build_prompt, extract_sources, format_context, truncate_to_token_budget};
use crate::llm::LlmGenerator;

/// Answer returned when retrieval finds nothing.
pub const NO_RELEVANT_INFORMATION: &str =
    "I could not find relevant information in the contract corpus to answer this question.";

const DEFAULT_MAX_ANSWER_TOKENS: u32 = 1024;

/// Per-question knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOptions {
    /// Retrieval options passed through unchanged.
    pub retrieve: RetrieveOptions,
    /// Drop lowest-ranked results until the context estimate fits.
    pub max_context_tokens: Option<usize>,
    /// Completion token cap.
    pub max_answer_tokens: u32,
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            retrieve: RetrieveOptions::default(),
            max_context_tokens: None,
            max_answer_tokens: DEFAULT_MAX_ANSWER_TOKENS,
        }
    }
}

/// A cited answer and its accounting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphRagAnswer {
    /// Answer text; citations refer to `sources`.
    pub answer: String,
    /// Citation entries in context order.
    pub sources: Vec<Source>,
    /// Classified question complexity.
    pub complexity: QueryComplexity,
    /// Generating model, empty when no generation happened.
    pub model_name: String,
    /// Prompt tokens billed.
    pub input_tokens: u32,
    /// Completion tokens billed.
    pub output_tokens: u32,
    /// Cost in USD.
    pub cost: f64,
    /// Semantic results retrieved (before budget truncation).
    pub semantic_count: usize,
    /// Graph results retrieved (before budget truncation).
    pub graph_count: usize,
    /// Token estimate of the context actually sent.
    pub context_tokens: usize,
}

/// Retrieval plus generation over injected collaborators.
#[derive(Clone)]
pub struct GraphRagWorkflow {
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn LlmGenerator>,
}

impl std::fmt::Debug for GraphRagWorkflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphRagWorkflow").finish_non_exhaustive()
    }
}

impl GraphRagWorkflow {
    /// Workflow over a retriever and a generator.
    #[must_use]
    pub fn new(retriever: Arc<dyn Retriever>, llm: Arc<dyn LlmGenerator>) -> Self {
        Self { retriever, llm }
    }

    /// Answer `question` from retrieved contract evidence.
    ///
    /// # Errors
    ///
    /// [`WorkflowError::InvalidQuestion`] for a blank question (before any I/O),
    /// otherwise retrieval or generation failures.
    pub async fn answer(
        &self,
        question: &str,
        options: &AnswerOptions,
    ) -> Result<GraphRagAnswer, WorkflowError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(WorkflowError::InvalidQuestion(
                "question must not be empty".to_string(),
            ));
        }
        let complexity = classify_complexity(question);

        let response = self.retriever.retrieve(question, &options.retrieve).await?;
        let (semantic_count, graph_count) = (response.semantic_count, response.graph_count);
        let retrieved = response.results.len();
        let results = match options.max_context_tokens {
            Some(budget) => truncate_to_token_budget(response.results, budget),
            None => response.results,
        };
        if results.len() < retrieved {
            debug!(
                event = "workflow.context.truncated",
                kept = results.len(),
                dropped = retrieved - results.len(),
                "context truncated to token budget"
            );
        }

        if results.is_empty() {
            info!(
                event = "workflow.answer.no_context",
                complexity = %complexity,
                "no evidence retrieved; skipping generation"
            );
            return Ok(GraphRagAnswer {
                answer: NO_RELEVANT_INFORMATION.to_string(),
                sources: Vec::new(),
                complexity,
                model_name: String::new(),
                input_tokens: 0,
                output_tokens: 0,
                cost: 0.0,
                semantic_count,
                graph_count,
                context_tokens: 0,
            });
        }

        let context = format_context(&results);
        let sources = extract_sources(&results);
        let context_tokens = estimate_tokens(&results);
        let prompt = build_prompt(question, &context);
        let generation = self
            .llm
            .generate(&prompt, complexity, options.max_answer_tokens)
            .await?;

        info!(
            event = "workflow.answer.generated",
            complexity = %complexity,
            model = %generation.model_name,
            sources = sources.len(),
            context_tokens,
            input_tokens = generation.input_tokens,
            output_tokens = generation.output_tokens,
            "answer generated"
        );
        Ok(GraphRagAnswer {
            answer: generation.text,
            sources,
            complexity,
            model_name: generation.model_name,
            input_tokens: generation.input_tokens,
            output_tokens: generation.output_tokens,
            cost: generation.cost,
            semantic_count,
            graph_count,
            context_tokens,
        })
    }
}
