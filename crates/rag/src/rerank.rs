//! Cross-encoder rerank stage
//!
//! Sends the candidate head through the rerank gateway for a precision
//! reordering. Degrades to a pass-through on a missing gateway, a gateway
//! failure, or fewer than two candidates — losing the rerank never loses the
//! answer.

use std::sync::Arc;

use bhorti_llm::{backend::Reranker, GatewayError};

use crate::ScoredDoc;

pub struct CrossEncoderStage {
    reranker: Option<Arc<dyn Reranker>>,
}

impl CrossEncoderStage {
    pub fn new(reranker: Option<Arc<dyn Reranker>>) -> Self {
        Self { reranker }
    }

    pub fn is_active(&self) -> bool {
        self.reranker.is_some()
    }

    /// Rerank `candidates` (already truncated to `2 × top_k` by the caller)
    /// and return the top `top_k` with gateway scores.
    pub async fn rerank(&self, query: &str, candidates: Vec<ScoredDoc>, top_k: usize) -> Vec<ScoredDoc> {
        let reranker = match &self.reranker {
            Some(r) if candidates.len() > 1 => r,
            _ => return Self::pass_through(candidates, top_k),
        };

        let documents: Vec<String> = candidates.iter().map(|d| d.text.clone()).collect();
        match reranker.rerank(query, &documents, top_k).await {
            Ok(ranked) => ranked
                .into_iter()
                .filter_map(|(idx, score)| {
                    candidates.get(idx).map(|doc| ScoredDoc {
                        id: doc.id.clone(),
                        text: doc.text.clone(),
                        score,
                    })
                })
                .collect(),
            Err(e) => {
                Self::log_failure(&e);
                Self::pass_through(candidates, top_k)
            }
        }
    }

    fn log_failure(error: &GatewayError) {
        tracing::warn!("cross-encoder rerank failed, passing through: {}", error);
    }

    fn pass_through(candidates: Vec<ScoredDoc>, top_k: usize) -> Vec<ScoredDoc> {
        candidates.into_iter().take(top_k).collect()
    }
}
