//! Embedding store
//!
//! An ordered id list aligned row-for-row with a dense matrix. All rows are
//! L2-normalized at insert time, so cosine similarity against a normalized
//! query is a single matrix–vector product.

use std::collections::HashMap;
use std::path::Path;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::GraphError;

#[derive(Serialize, Deserialize)]
struct PersistedStore {
    dim: usize,
    ids: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

/// id → row mapping over a dense, normalized embedding matrix.
#[derive(Debug, Clone)]
pub struct EmbeddingStore {
    ids: Vec<String>,
    positions: HashMap<String, usize>,
    matrix: Array2<f32>,
    dim: usize,
}

impl EmbeddingStore {
    /// Build from aligned ids and vectors. Vectors are normalized here;
    /// mixed dimensions are rejected.
    pub fn from_rows(ids: Vec<String>, vectors: Vec<Vec<f32>>, dim: usize) -> Result<Self, GraphError> {
        if ids.len() != vectors.len() {
            return Err(GraphError::DimensionMismatch(format!(
                "{} ids but {} vectors",
                ids.len(),
                vectors.len()
            )));
        }
        let mut matrix = Array2::<f32>::zeros((ids.len(), dim));
        for (row, vector) in vectors.into_iter().enumerate() {
            if vector.len() != dim {
                return Err(GraphError::DimensionMismatch(format!(
                    "row {} has dim {}, expected {}",
                    row,
                    vector.len(),
                    dim
                )));
            }
            let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
            for (col, value) in vector.into_iter().enumerate() {
                matrix[(row, col)] = if norm > 0.0 { value / norm } else { 0.0 };
            }
        }
        let positions = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();
        Ok(Self {
            ids,
            positions,
            matrix,
            dim,
        })
    }

    pub fn empty(dim: usize) -> Self {
        Self {
            ids: Vec::new(),
            positions: HashMap::new(),
            matrix: Array2::zeros((0, dim)),
            dim,
        }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    pub fn id_at(&self, row: usize) -> Option<&str> {
        self.ids.get(row).map(|s| s.as_str())
    }

    /// Cosine similarity of a normalized query against every row.
    pub fn cosine_scores(&self, query: &[f32]) -> Result<Array1<f32>, GraphError> {
        if query.len() != self.dim {
            return Err(GraphError::DimensionMismatch(format!(
                "query dim {} != store dim {}",
                query.len(),
                self.dim
            )));
        }
        let q = Array1::from_vec(query.to_vec());
        Ok(self.matrix.dot(&q))
    }

    // --- persistence ---

    pub fn save(&self, path: &Path) -> Result<(), GraphError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GraphError::Storage(e.to_string()))?;
        }
        let vectors = self
            .matrix
            .outer_iter()
            .map(|row| row.to_vec())
            .collect::<Vec<_>>();
        let persisted = PersistedStore {
            dim: self.dim,
            ids: self.ids.clone(),
            vectors,
        };
        let json =
            serde_json::to_string(&persisted).map_err(|e| GraphError::Storage(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| GraphError::Storage(e.to_string()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let json =
            std::fs::read_to_string(path).map_err(|e| GraphError::Storage(e.to_string()))?;
        let persisted: PersistedStore =
            serde_json::from_str(&json).map_err(|e| GraphError::Storage(e.to_string()))?;
        Self::from_rows(persisted.ids, persisted.vectors, persisted.dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> EmbeddingStore {
        EmbeddingStore::from_rows(
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 2.0, 0.0],
                vec![1.0, 1.0, 0.0],
            ],
            3,
        )
        .unwrap()
    }

    #[test]
    fn test_rows_are_normalized() {
        let store = sample();
        let scores = store.cosine_scores(&[0.0, 1.0, 0.0]).unwrap();
        assert!((scores[1] - 1.0).abs() < 1e-6);
        assert!((scores[2] - (1.0 / 2.0f32.sqrt())).abs() < 1e-6);
    }

    #[test]
    fn test_position_lookup() {
        let store = sample();
        assert_eq!(store.position("b"), Some(1));
        assert_eq!(store.id_at(2), Some("c"));
        assert_eq!(store.position("zzz"), None);
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let bad = EmbeddingStore::from_rows(
            vec!["a".to_string()],
            vec![vec![1.0, 0.0]],
            3,
        );
        assert!(bad.is_err());
        let store = sample();
        assert!(store.cosine_scores(&[1.0, 0.0]).is_err());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("passage_embeddings").join("store.json");
        let store = sample();
        store.save(&path).unwrap();
        let loaded = EmbeddingStore::load(&path).unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.ids(), store.ids());
        let scores = loaded.cosine_scores(&[1.0, 0.0, 0.0]).unwrap();
        assert!((scores[0] - 1.0).abs() < 1e-6);
    }
}
