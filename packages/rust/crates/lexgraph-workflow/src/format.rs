//! Cited context formatting, source extraction and prompt assembly.
//!
//! Citation `[N]` in the formatted context always resolves to `sources[N-1]`.

use lexgraph_retrieval::{RetrievalResult, RetrievalSource};
use serde::Serialize;

const PREVIEW_CHARS: usize = 100;

/// Citation entry for one context block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Source {
    /// 1-based citation number.
    pub index: usize,
    /// Producing retrieval path.
    pub source_type: RetrievalSource,
    /// Graph item kind (`company`, `clause`, `risk`, `metadata`), if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    /// Owning contract.
    pub contract_id: String,
    /// Fused RRF score.
    pub score: f32,
    /// First 100 characters of the content, `...` appended when cut.
    pub preview: String,
}

fn block_header(index: usize, result: &RetrievalResult) -> String {
    match result.source {
        RetrievalSource::Semantic => {
            format!("[{index}] Document (contract {})", result.contract_id)
        }
        RetrievalSource::Graph => match result.item_type() {
            Some(kind) => format!(
                "[{index}] Knowledge Graph (contract {}, {kind})",
                result.contract_id
            ),
            None => format!("[{index}] Knowledge Graph (contract {})", result.contract_id),
        },
    }
}

/// Render results, in order, as numbered context blocks separated by blank lines.
#[must_use]
pub fn format_context(results: &[RetrievalResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| format!("{}\n{}", block_header(i + 1, result), result.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn preview(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

/// Citation entries in the same order as [`format_context`].
#[must_use]
pub fn extract_sources(results: &[RetrievalResult]) -> Vec<Source> {
    results
        .iter()
        .enumerate()
        .map(|(i, result)| Source {
            index: i + 1,
            source_type: result.source,
            item_type: result.item_type().map(str::to_string),
            contract_id: result.contract_id.clone(),
            score: result.rrf_score(),
            preview: preview(&result.content),
        })
        .collect()
}

/// Keep the longest ranked prefix whose `chars / 4` estimate fits `budget`.
///
/// The top-ranked result is always kept so a tight budget never empties the
/// context on its own.
#[must_use]
pub fn truncate_to_token_budget(
    mut results: Vec<RetrievalResult>,
    budget: usize,
) -> Vec<RetrievalResult> {
    let mut chars = 0usize;
    let mut keep = 0usize;
    for result in &results {
        let next = chars + result.content.chars().count();
        if keep > 0 && next / 4 > budget {
            break;
        }
        chars = next;
        keep += 1;
    }
    results.truncate(keep);
    results
}

/// Question, cited context and answering instructions.
#[must_use]
pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "You are a legal contract analyst. Answer the question using only the numbered \
         context below.\n\
         Cite every statement with the bracketed number of its source, e.g. [1] or [2][3].\n\
         If the context does not contain the answer, say so.\n\n\
         Context:\n{context}\n\n\
         Question: {question}\n\n\
         Answer:"
    )
}

#[cfg(test)]
mod tests {
    use lexgraph_retrieval::{RetrievalResult, RetrievalSource};
    use serde_json::{Map, Value};

    use super::{extract_sources, format_context, preview, truncate_to_token_budget};

    fn graph(kind: &str, content: &str) -> RetrievalResult {
        let mut metadata = Map::new();
        metadata.insert("type".to_string(), Value::String(kind.to_string()));
        RetrievalResult::graph("c1", content, 0.7, metadata)
    }

    #[test]
    fn test_format_context_headers() {
        let results = vec![
            RetrievalResult::semantic("c1", "Either party may terminate.", 0.9, Map::new()),
            graph("company", "Party: Acme Corp (role: licensor)"),
            RetrievalResult::graph("c2", "bare", 0.5, Map::new()),
        ];
        assert_eq!(
            format_context(&results),
            "[1] Document (contract c1)\nEither party may terminate.\n\n\
             [2] Knowledge Graph (contract c1, company)\nParty: Acme Corp (role: licensor)\n\n\
             [3] Knowledge Graph (contract c2)\nbare"
        );
        assert_eq!(format_context(&[]), "");
    }

    #[test]
    fn test_sources_align_with_citations() {
        let results = vec![
            RetrievalResult::semantic("c1", "alpha", 0.9, Map::new()),
            graph("risk", "Risk (high): cap - uncapped"),
        ];
        let sources = extract_sources(&results);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].index, 1);
        assert_eq!(sources[0].source_type, RetrievalSource::Semantic);
        assert_eq!(sources[1].index, 2);
        assert_eq!(sources[1].item_type.as_deref(), Some("risk"));
        assert_eq!(sources[1].preview, "Risk (high): cap - uncapped");
    }

    #[test]
    fn test_preview_counts_characters() {
        let exact = "é".repeat(100);
        assert_eq!(preview(&exact), exact);
        let long = "é".repeat(101);
        assert_eq!(preview(&long), format!("{exact}..."));
    }

    #[test]
    fn test_truncate_drops_lowest_ranked() {
        let results = vec![
            RetrievalResult::semantic("c1", "a".repeat(40), 0.9, Map::new()),
            RetrievalResult::semantic("c1", "b".repeat(40), 0.8, Map::new()),
            RetrievalResult::semantic("c1", "c".repeat(40), 0.7, Map::new()),
        ];
        let kept = truncate_to_token_budget(results.clone(), 20);
        assert_eq!(kept.len(), 2);
        assert!(kept[1].content.starts_with('b'));

        let kept = truncate_to_token_budget(results, 1);
        assert_eq!(kept.len(), 1);
        assert!(kept[0].content.starts_with('a'));
    }
}
