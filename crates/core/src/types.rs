//! Query-time and index-time data types

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::ids;
use crate::Intent;

/// An immutable chunk of a source circular.
///
/// The text is prefixed at index time with a bracketed source-institution tag
/// (e.g. `[চট্টগ্রাম বিশ্ববিদ্যালয় CU]`), which the university filter and the
/// answer prompts rely on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// Stable content hash (`chunk-…`).
    pub id: String,
    pub text: String,
}

impl Passage {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: ids::passage_id(&text),
            text,
        }
    }
}

/// A `(subject, predicate, object)` triple extracted at index time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl Fact {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    pub fn id(&self) -> String {
        ids::fact_id(&self.subject, &self.predicate, &self.object)
    }

    /// Canonical display form used in filter prompts and closest-match
    /// comparison.
    pub fn as_display(&self) -> String {
        format!("[{}, {}, {}]", self.subject, self.predicate, self.object)
    }
}

/// An institution detected in the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedEntity {
    /// Lowercase abbreviation (`"kuet"`, `"du"`, …) — the key used for
    /// filter-rule lookup and multi-entity reassembly.
    pub abbrev: String,
    /// Full institution name used when prefixing sub-queries.
    pub full_name: String,
}

/// A passage id paired with a retrieval score.
pub type ScoredPassage = (String, f32);

/// Which retrieval branch produced the candidate ranking.
///
/// Threaded through the fusion stage instead of signalling "no facts matched"
/// by exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalMode {
    /// No graph facts matched; dense retrieval alone ranked the passages.
    DprOnly,
    /// Personalized PageRank blended with dense scores.
    HybridPprDpr,
}

impl RetrievalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalMode::DprOnly => "dpr_only",
            RetrievalMode::HybridPprDpr => "hybrid_ppr_dpr",
        }
    }
}

/// Internal result of the retrieval stage for one (sub-)query.
#[derive(Debug, Clone)]
pub struct QueryResult {
    pub question: String,
    /// Ranked `(passage_id, score)` candidates, best first.
    pub candidate_passages: Vec<ScoredPassage>,
    /// Facts kept by the LLM filter (empty in DPR-only mode).
    pub matched_facts: Vec<Fact>,
    /// Entity phrases that seeded the graph walk.
    pub query_entities: Vec<String>,
    pub intent: Intent,
    pub mode: RetrievalMode,
}

/// A cited source returned with an answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    pub content: String,
    pub score: f32,
}

impl Reference {
    /// Build a reference, truncating the content at a grapheme boundary so
    /// Bangla conjuncts are never split mid-cluster.
    pub fn truncated(text: &str, score: f32, max_chars: usize) -> Self {
        Self {
            content: truncate_graphemes(text, max_chars),
            score,
        }
    }
}

/// Truncate to at most `max_chars` characters without splitting a grapheme
/// cluster; appends an ellipsis when anything was cut.
pub fn truncate_graphemes(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut taken = 0usize;
    let mut out = String::new();
    for g in text.graphemes(true) {
        let n = g.chars().count();
        if taken + n > max_chars {
            break;
        }
        out.push_str(g);
        taken += n;
    }
    out.push('…');
    out
}
