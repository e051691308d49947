//! Okapi BM25 sparse retrieval
//!
//! Tokenization is Unicode-word (`\w+`) over the lowercased text, which
//! keeps Bengali script intact — the same tokenizer runs at index and query
//! time. Query scores are min-max normalized into `[0, 1]` so they fuse with
//! cosine scores.
//!
//! Persistence stores doc ids plus tokenized docs; the Okapi statistics are
//! rebuilt on load.

use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::RagError;

const K1: f64 = 1.5;
const B: f64 = 0.75;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word regex"));

/// Unicode-word tokenizer shared by indexing and querying.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[derive(Serialize, Deserialize)]
struct PersistedBm25 {
    doc_ids: Vec<String>,
    tokenized_docs: Vec<Vec<String>>,
}

/// BM25 index over the passage corpus.
pub struct Bm25Index {
    doc_ids: Vec<String>,
    tokenized_docs: Vec<Vec<String>>,
    /// term → per-doc frequency map.
    postings: HashMap<String, Vec<(usize, usize)>>,
    idf: HashMap<String, f64>,
    doc_lens: Vec<usize>,
    avg_doc_len: f64,
}

impl Bm25Index {
    /// Build from `(passage_id, text)` pairs.
    pub fn build<'a>(docs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut doc_ids = Vec::new();
        let mut tokenized_docs = Vec::new();
        for (id, text) in docs {
            doc_ids.push(id.to_string());
            tokenized_docs.push(tokenize(text));
        }
        Self::from_tokenized(doc_ids, tokenized_docs)
    }

    fn from_tokenized(doc_ids: Vec<String>, tokenized_docs: Vec<Vec<String>>) -> Self {
        let n = tokenized_docs.len();
        let doc_lens: Vec<usize> = tokenized_docs.iter().map(|d| d.len()).collect();
        let avg_doc_len = if n > 0 {
            doc_lens.iter().sum::<usize>() as f64 / n as f64
        } else {
            0.0
        };

        let mut postings: HashMap<String, Vec<(usize, usize)>> = HashMap::new();
        for (doc_idx, tokens) in tokenized_docs.iter().enumerate() {
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for token in tokens {
                *counts.entry(token.as_str()).or_insert(0) += 1;
            }
            for (term, count) in counts {
                postings
                    .entry(term.to_string())
                    .or_default()
                    .push((doc_idx, count));
            }
        }

        // Okapi idf with the +1 floor, as in rank-bm25's BM25Okapi.
        let idf = postings
            .iter()
            .map(|(term, docs)| {
                let df = docs.len() as f64;
                let value = (((n as f64 - df + 0.5) / (df + 0.5)) + 1.0).ln();
                (term.clone(), value)
            })
            .collect();

        Self {
            doc_ids,
            tokenized_docs,
            postings,
            idf,
            doc_lens,
            avg_doc_len,
        }
    }

    pub fn len(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }

    /// Score the query against the whole corpus, min-max normalize into
    /// `[0, 1]`, and return `(doc_id, score)` sorted descending. `top_k`
    /// truncates after normalization.
    pub fn search(&self, query: &str, top_k: Option<usize>) -> Vec<(String, f32)> {
        if self.is_empty() {
            return Vec::new();
        }

        let mut scores = vec![0.0f64; self.len()];
        for term in tokenize(query) {
            let (idf, docs) = match (self.idf.get(&term), self.postings.get(&term)) {
                (Some(idf), Some(docs)) => (*idf, docs),
                _ => continue,
            };
            for &(doc_idx, tf) in docs {
                let tf = tf as f64;
                let len_norm = 1.0 - B + B * self.doc_lens[doc_idx] as f64 / self.avg_doc_len;
                scores[doc_idx] += idf * (tf * (K1 + 1.0)) / (tf + K1 * len_norm);
            }
        }

        let min = scores.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let normalized: Vec<f64> = if max > min {
            scores.iter().map(|s| (s - min) / (max - min)).collect()
        } else {
            vec![0.0; scores.len()]
        };

        let mut ranked: Vec<(String, f32)> = normalized
            .into_iter()
            .enumerate()
            .map(|(idx, score)| (self.doc_ids[idx].clone(), score as f32))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        if let Some(k) = top_k {
            ranked.truncate(k);
        }
        ranked
    }

    // --- persistence ---

    pub fn save(&self, path: &Path) -> Result<(), RagError> {
        let persisted = PersistedBm25 {
            doc_ids: self.doc_ids.clone(),
            tokenized_docs: self.tokenized_docs.clone(),
        };
        let json = serde_json::to_string(&persisted)
            .map_err(|e| RagError::Index(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RagError::Index(e.to_string()))?;
        }
        std::fs::write(path, json).map_err(|e| RagError::Index(e.to_string()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, RagError> {
        let json = std::fs::read_to_string(path).map_err(|e| RagError::Index(e.to_string()))?;
        let persisted: PersistedBm25 =
            serde_json::from_str(&json).map_err(|e| RagError::Index(e.to_string()))?;
        tracing::info!(docs = persisted.doc_ids.len(), "BM25 index loaded");
        Ok(Self::from_tokenized(
            persisted.doc_ids,
            persisted.tokenized_docs,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Bm25Index {
        Bm25Index::build([
            ("p1", "কুয়েট ভর্তি পরীক্ষার তারিখ ১০ জানুয়ারি"),
            ("p2", "ঢাকা বিশ্ববিদ্যালয় আবেদন ফি ১০০০ টাকা"),
            ("p3", "কুয়েট আবেদন ফি ১২০০ টাকা"),
        ])
    }

    #[test]
    fn test_tokenize_preserves_bengali() {
        let tokens = tokenize("কুয়েট ভর্তি KUET Admission 2026!");
        assert_eq!(
            tokens,
            vec!["কুয়েট", "ভর্তি", "kuet", "admission", "2026"]
        );
    }

    #[test]
    fn test_scores_normalized_and_sorted() {
        let index = sample();
        let results = index.search("কুয়েট তারিখ", None);
        assert_eq!(results.len(), 3);
        // Top doc has score exactly 1 when distinct scores exist.
        assert!((results[0].1 - 1.0).abs() < 1e-6);
        assert_eq!(results[0].0, "p1");
        for pair in results.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        for (_, score) in &results {
            assert!((0.0..=1.0).contains(score));
        }
    }

    #[test]
    fn test_no_match_yields_zero_scores() {
        let index = sample();
        let results = index.search("সম্পূর্ণ অপ্রাসঙ্গিক", None);
        assert!(results.iter().all(|(_, s)| *s == 0.0));
    }

    #[test]
    fn test_top_k_truncation() {
        let index = sample();
        assert_eq!(index.search("কুয়েট", Some(2)).len(), 2);
    }

    #[test]
    fn test_save_load_same_ranking() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bm25_index.json");
        let index = sample();
        index.save(&path).unwrap();
        let loaded = Bm25Index::load(&path).unwrap();
        assert_eq!(
            index.search("কুয়েট ফি", Some(3)),
            loaded.search("কুয়েট ফি", Some(3))
        );
    }

    #[test]
    fn test_empty_index() {
        let index = Bm25Index::build(std::iter::empty::<(&str, &str)>());
        assert!(index.search("anything", None).is_empty());
    }
}
