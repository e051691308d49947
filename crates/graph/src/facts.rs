//! Fact index
//!
//! Fact triples aligned with their embedding rows, enabling one cosine pass
//! over every fact for a query embedding.

use std::path::Path;

use serde::{Deserialize, Serialize};

use bhorti_core::Fact;

use crate::store::EmbeddingStore;
use crate::GraphError;

#[derive(Serialize, Deserialize)]
struct PersistedFacts {
    facts: Vec<Fact>,
}

/// Ordered facts + embedding matrix. Row `i` of the store embeds
/// `facts[i]`.
#[derive(Debug, Clone)]
pub struct FactIndex {
    facts: Vec<Fact>,
    embeddings: EmbeddingStore,
}

impl FactIndex {
    pub fn new(facts: Vec<Fact>, embeddings: EmbeddingStore) -> Result<Self, GraphError> {
        if facts.len() != embeddings.len() {
            return Err(GraphError::DimensionMismatch(format!(
                "{} facts but {} embeddings",
                facts.len(),
                embeddings.len()
            )));
        }
        Ok(Self { facts, embeddings })
    }

    pub fn empty(dim: usize) -> Self {
        Self {
            facts: Vec::new(),
            embeddings: EmbeddingStore::empty(dim),
        }
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn fact(&self, idx: usize) -> Option<&Fact> {
        self.facts.get(idx)
    }

    pub fn facts(&self) -> &[Fact] {
        &self.facts
    }

    /// Cosine of the query against every fact embedding, aligned with
    /// [`Self::facts`].
    pub fn scores(&self, query: &[f32]) -> Result<Vec<f32>, GraphError> {
        Ok(self.embeddings.cosine_scores(query)?.to_vec())
    }

    // --- persistence: triples next to their embedding store ---

    pub fn save(&self, facts_path: &Path, store_path: &Path) -> Result<(), GraphError> {
        let json = serde_json::to_string(&PersistedFacts {
            facts: self.facts.clone(),
        })
        .map_err(|e| GraphError::Storage(e.to_string()))?;
        if let Some(parent) = facts_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GraphError::Storage(e.to_string()))?;
        }
        std::fs::write(facts_path, json).map_err(|e| GraphError::Storage(e.to_string()))?;
        self.embeddings.save(store_path)
    }

    pub fn load(facts_path: &Path, store_path: &Path) -> Result<Self, GraphError> {
        let json = std::fs::read_to_string(facts_path)
            .map_err(|e| GraphError::Storage(e.to_string()))?;
        let persisted: PersistedFacts =
            serde_json::from_str(&json).map_err(|e| GraphError::Storage(e.to_string()))?;
        let embeddings = EmbeddingStore::load(store_path)?;
        Self::new(persisted.facts, embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> FactIndex {
        let facts = vec![
            Fact::new("কুয়েট", "ভর্তি পরীক্ষার তারিখ", "১০ জানুয়ারি ২০২৬"),
            Fact::new("কুয়েট", "আবেদন ফি", "১২০০ টাকা"),
        ];
        let store = EmbeddingStore::from_rows(
            facts.iter().map(|f| f.id()).collect(),
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            2,
        )
        .unwrap();
        FactIndex::new(facts, store).unwrap()
    }

    #[test]
    fn test_scores_align_with_facts() {
        let index = sample();
        let scores = index.scores(&[1.0, 0.0]).unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores[0] > scores[1]);
        assert_eq!(index.fact(0).unwrap().predicate, "ভর্তি পরীক্ষার তারিখ");
    }

    #[test]
    fn test_misaligned_lengths_rejected() {
        let store = EmbeddingStore::from_rows(vec!["x".to_string()], vec![vec![1.0]], 1).unwrap();
        assert!(FactIndex::new(vec![], store).is_err());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let facts_path = dir.path().join("facts.json");
        let store_path = dir.path().join("fact_embeddings").join("store.json");
        let index = sample();
        index.save(&facts_path, &store_path).unwrap();
        let loaded = FactIndex::load(&facts_path, &store_path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.fact(1).unwrap().object, "১২০০ টাকা");
    }
}
