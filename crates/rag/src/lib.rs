//! Hybrid retrieval engine
//!
//! The retrieval stages of the question-answering pipeline:
//! - [`dense`]: cosine ranking over passage embeddings (DPR)
//! - [`bm25`]: sparse Okapi BM25 with min-max normalized scores
//! - [`facts`]: fact matching against the knowledge graph plus the LLM
//!   relevance filter
//! - [`fusion`]: adaptive PPR+DPR blending and reciprocal rank fusion
//! - [`university_filter`]: marker-based inclusion/exclusion with
//!   confusable-pair disambiguation
//! - [`rerank`]: cross-encoder precision pass with pass-through fallback
//!
//! All score arithmetic here is synchronous; only the fact filter and the
//! rerank stage await gateways.

pub mod bm25;
pub mod dense;
pub mod facts;
pub mod fusion;
pub mod rerank;
pub mod university_filter;

pub use bm25::Bm25Index;
pub use dense::DenseRetriever;
pub use facts::{FactFilterOutcome, FactMatcher};
pub use fusion::{adaptive_fuse, min_max_normalize, rrf_fuse};
pub use rerank::CrossEncoderStage;
pub use university_filter::{filter_documents_by_university, strict_university_filter};

use serde::Serialize;
use thiserror::Error;

/// A passage with its running retrieval score. The unit every stage in this
/// crate consumes and produces.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredDoc {
    pub id: String,
    pub text: String,
    pub score: f32,
}

impl ScoredDoc {
    pub fn new(id: impl Into<String>, text: impl Into<String>, score: f32) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            score,
        }
    }
}

/// Sort best-first with a stable total order despite float scores.
pub fn sort_by_score_desc(docs: &mut [ScoredDoc]) {
    docs.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Graph error: {0}")]
    Graph(#[from] bhorti_graph::GraphError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] bhorti_llm::GatewayError),

    #[error("Index error: {0}")]
    Index(String),
}

impl From<RagError> for bhorti_core::Error {
    fn from(err: RagError) -> Self {
        match err {
            RagError::Gateway(e) => e.into(),
            RagError::Graph(e) => e.into(),
            RagError::Index(s) => bhorti_core::Error::Retrieval(s),
        }
    }
}
