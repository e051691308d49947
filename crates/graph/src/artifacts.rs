//! Persisted artifact layout
//!
//! Everything lives under a configurable `save_dir`:
//!
//! ```text
//! <save_dir>/
//!   graph.json
//!   passage_embeddings/store.json
//!   entity_embeddings/store.json
//!   fact_embeddings/store.json
//!   facts.json
//!   bm25_index.json
//!   llm_cache/<model>.sqlite
//!   openie_results_ner_<model>.json
//! ```

use std::path::{Path, PathBuf};

/// Path helpers for the on-disk artifact layout.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    root: PathBuf,
}

impl ArtifactPaths {
    pub fn new(save_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: save_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn graph(&self) -> PathBuf {
        self.root.join("graph.json")
    }

    pub fn passage_store(&self) -> PathBuf {
        self.root.join("passage_embeddings").join("store.json")
    }

    pub fn entity_store(&self) -> PathBuf {
        self.root.join("entity_embeddings").join("store.json")
    }

    pub fn fact_store(&self) -> PathBuf {
        self.root.join("fact_embeddings").join("store.json")
    }

    pub fn facts(&self) -> PathBuf {
        self.root.join("facts.json")
    }

    pub fn bm25(&self) -> PathBuf {
        self.root.join("bm25_index.json")
    }

    pub fn llm_cache_dir(&self) -> PathBuf {
        self.root.join("llm_cache")
    }

    pub fn openie_results(&self, model: &str) -> PathBuf {
        self.root
            .join(format!("openie_results_ner_{}.json", model.replace('/', "_")))
    }

    /// True when a previously built index is present on disk.
    pub fn index_exists(&self) -> bool {
        self.graph().exists() && self.passage_store().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let paths = ArtifactPaths::new("outputs");
        assert_eq!(paths.graph(), PathBuf::from("outputs/graph.json"));
        assert_eq!(
            paths.passage_store(),
            PathBuf::from("outputs/passage_embeddings/store.json")
        );
        assert_eq!(
            paths.openie_results("gemini/gemini-2.5-flash"),
            PathBuf::from("outputs/openie_results_ner_gemini_gemini-2.5-flash.json")
        );
    }

    #[test]
    fn test_index_exists_false_for_fresh_dir() {
        let paths = ArtifactPaths::new("/nonexistent/xyz");
        assert!(!paths.index_exists());
    }
}
