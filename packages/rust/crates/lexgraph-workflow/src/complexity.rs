//! Query complexity classification used to pick a model tier.

use serde::Serialize;

const COMPLEX_MARKERS: &[&str] = &[
    "compare",
    "comparison",
    "analyze",
    "analyse",
    "across",
    "implication",
    "trade-off",
    "tradeoff",
    "difference between",
    "all contracts",
    "risk assessment",
    "why",
];

const MODERATE_MARKERS: &[&str] = &[
    "explain",
    "summarize",
    "summarise",
    "describe",
    "list",
    "what are",
    "how does",
    "how do",
    "obligation",
    "risk",
];

const COMPLEX_MIN_WORDS: usize = 25;
const MODERATE_MIN_WORDS: usize = 12;

/// Coarse difficulty of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryComplexity {
    /// Single fact lookup.
    #[default]
    Simple,
    /// Explanation or summary of one topic.
    Moderate,
    /// Multi-document reasoning or comparison.
    Complex,
}

impl QueryComplexity {
    /// Lowercase label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
        }
    }
}

impl std::fmt::Display for QueryComplexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify by marker phrases first, then by word count.
#[must_use]
pub fn classify_complexity(question: &str) -> QueryComplexity {
    let lowered = question.to_lowercase();
    let words = lowered.split_whitespace().count();
    let has_any = |markers: &[&str]| markers.iter().any(|m| contains_phrase(&lowered, m));

    if has_any(COMPLEX_MARKERS) || words >= COMPLEX_MIN_WORDS {
        QueryComplexity::Complex
    } else if has_any(MODERATE_MARKERS) || words >= MODERATE_MIN_WORDS {
        QueryComplexity::Moderate
    } else {
        QueryComplexity::Simple
    }
}

/// Phrase match on word boundaries; a trailing `s` is tolerated.
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let is_word = |c: char| c.is_alphanumeric() || c == '-';
    haystack.match_indices(phrase).any(|(start, _)| {
        let before_ok = haystack[..start].chars().next_back().is_none_or(|c| !is_word(c));
        let rest = &haystack[start + phrase.len()..];
        let rest = rest.strip_prefix('s').unwrap_or(rest);
        let after_ok = rest.chars().next().is_none_or(|c| !is_word(c));
        before_ok && after_ok
    })
}
