//! Dense passage retrieval
//!
//! Cosine similarity of a query embedding against the passage matrix. The
//! full ranking is returned; callers truncate. Embedding the query happens
//! upstream (one gateway call per request, reused by every stage that needs
//! it).

use std::sync::Arc;

use bhorti_graph::EmbeddingStore;

use crate::RagError;

pub struct DenseRetriever {
    store: Arc<EmbeddingStore>,
}

impl DenseRetriever {
    pub fn new(store: Arc<EmbeddingStore>) -> Self {
        Self { store }
    }

    pub fn passage_count(&self) -> usize {
        self.store.len()
    }

    /// Rank every passage by cosine similarity, best first.
    pub fn rank(&self, query_embedding: &[f32]) -> Result<Vec<(String, f32)>, RagError> {
        let scores = self.store.cosine_scores(query_embedding)?;
        let mut ranked: Vec<(String, f32)> = scores
            .iter()
            .enumerate()
            .map(|(row, &score)| {
                (
                    self.store
                        .id_at(row)
                        .expect("row within bounds")
                        .to_string(),
                    score,
                )
            })
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Arc<EmbeddingStore> {
        Arc::new(
            EmbeddingStore::from_rows(
                vec!["p1".to_string(), "p2".to_string(), "p3".to_string()],
                vec![
                    vec![1.0, 0.0],
                    vec![0.7, 0.7],
                    vec![0.0, 1.0],
                ],
                2,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_rank_orders_by_cosine() {
        let retriever = DenseRetriever::new(store());
        let ranked = retriever.rank(&[1.0, 0.0]).unwrap();
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].0, "p1");
        assert_eq!(ranked[2].0, "p3");
        assert!(ranked[0].1 >= ranked[1].1 && ranked[1].1 >= ranked[2].1);
    }

    #[test]
    fn test_dim_mismatch_is_error() {
        let retriever = DenseRetriever::new(store());
        assert!(retriever.rank(&[1.0, 0.0, 0.0]).is_err());
    }
}
