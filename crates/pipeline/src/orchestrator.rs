//! Multi-entity orchestrator
//!
//! Runs one sub-retrieval per decomposed entity on a bounded pool of tokio
//! tasks (width ≤ 4), each doing the two-pass dense+sparse retrieval, RRF
//! fusion, university filtering, date prioritization and near-duplicate
//! removal. Results are reassembled by entity abbreviation — completion
//! order is irrelevant. Cancellation is cooperative: tasks check a shared
//! flag between the retrieval passes.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};

use bhorti_config::constants::retrieval::{
    COVERAGE_MIN_DOCS, DEDUPE_JACCARD, DEDUPE_PREFIX_CHARS, MAX_PARALLEL_SUBQUERIES,
    PER_ENTITY_TOP_K,
};
use bhorti_config::domain::{intent_params, BENGALI_DATE_PATTERN, SCHEDULE_PHRASES};
use bhorti_core::{Error, Intent};
use bhorti_rag::{bm25::tokenize, rrf_fuse, ScoredDoc};

use crate::decompose::SubQuery;
use crate::engine::RetrievalEngine;
use crate::expand::expand_query;

/// One entity's independent retrieval result.
#[derive(Debug, Clone)]
pub struct EntityRetrieval {
    pub abbrev: String,
    pub full_name: String,
    pub sub_query: String,
    pub docs: Vec<ScoredDoc>,
    /// Fewer than the coverage threshold of docs survived; the synthesizer
    /// flags the block.
    pub low_coverage: bool,
}

pub struct MultiEntityOrchestrator {
    engine: Arc<RetrievalEngine>,
    cancel: Arc<AtomicBool>,
}

impl MultiEntityOrchestrator {
    pub fn new(engine: Arc<RetrievalEngine>) -> Self {
        Self {
            engine,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared cancellation flag; setting it stops outstanding sub-queries at
    /// their next checkpoint.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Retrieve all sub-queries in parallel; reassembled by abbreviation.
    pub async fn retrieve_all(
        &self,
        subs: Vec<SubQuery>,
        intent: Intent,
    ) -> Result<BTreeMap<String, EntityRetrieval>, Error> {
        let width = subs.len().min(MAX_PARALLEL_SUBQUERIES).max(1);
        let semaphore = Arc::new(Semaphore::new(width));
        let (tx, mut rx) = mpsc::channel::<Result<EntityRetrieval, Error>>(subs.len().max(1));

        let expected = subs.len();
        for sub in subs {
            let engine = self.engine.clone();
            let cancel = self.cancel.clone();
            let semaphore = semaphore.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = retrieve_entity(&engine, &sub, intent, &cancel).await;
                let _ = tx.send(result).await;
            });
        }
        drop(tx);

        let mut results = BTreeMap::new();
        let mut received = 0usize;
        while let Some(outcome) = rx.recv().await {
            received += 1;
            let entity = outcome?;
            results.insert(entity.abbrev.clone(), entity);
            if received == expected {
                break;
            }
        }
        Ok(results)
    }
}

/// The per-entity two-pass retrieval.
async fn retrieve_entity(
    engine: &RetrievalEngine,
    sub: &SubQuery,
    intent: Intent,
    cancel: &AtomicBool,
) -> Result<EntityRetrieval, Error> {
    if cancel.load(Ordering::Relaxed) {
        return Ok(empty_result(sub));
    }

    let params = intent_params(intent);
    let expanded = expand_query(&sub.query, intent);

    // Pass one: dense retrieval on the expanded sub-query.
    let embedding = engine.embed_one(&expanded).await?;
    let dense: Vec<(String, f32)> = engine
        .dense_rank(&embedding)?
        .into_iter()
        .take(params.top_k)
        .collect();

    if cancel.load(Ordering::Relaxed) {
        return Ok(empty_result(sub));
    }

    // Pass two: keyword-augmented BM25 for the literal-value intents.
    let mut lists = vec![dense];
    if intent.wants_sparse_pass() {
        let mut sparse_query = expanded.clone();
        for keyword in params.boost_keywords {
            sparse_query.push(' ');
            sparse_query.push_str(keyword);
        }
        lists.push(engine.bm25_search(&sparse_query, params.top_k));
    }

    let fused = rrf_fuse(&lists, engine.rrf_k());
    let docs = engine.to_scored_docs(&fused);
    let docs = bhorti_rag::filter_documents_by_university(docs, &sub.abbrev);

    let docs = if intent == Intent::Date {
        prioritize_schedules(docs)
    } else {
        docs
    };

    let mut docs = dedupe_by_jaccard(docs, DEDUPE_JACCARD, DEDUPE_PREFIX_CHARS);
    docs.truncate(PER_ENTITY_TOP_K);

    let low_coverage = docs.len() < COVERAGE_MIN_DOCS;
    if low_coverage {
        tracing::warn!(
            abbrev = %sub.abbrev,
            docs = docs.len(),
            "low coverage for entity"
        );
    }

    Ok(EntityRetrieval {
        abbrev: sub.abbrev.clone(),
        full_name: sub.full_name.clone(),
        sub_query: sub.query.clone(),
        docs,
        low_coverage,
    })
}

fn empty_result(sub: &SubQuery) -> EntityRetrieval {
    EntityRetrieval {
        abbrev: sub.abbrev.clone(),
        full_name: sub.full_name.clone(),
        sub_query: sub.query.clone(),
        docs: Vec::new(),
        low_coverage: true,
    }
}

/// Boost passages that look like schedule tables or carry explicit
/// Bengali-numeral dates, then re-sort by (priority, score).
pub fn prioritize_schedules(docs: Vec<ScoredDoc>) -> Vec<ScoredDoc> {
    let mut flagged: Vec<(bool, ScoredDoc)> = docs
        .into_iter()
        .map(|doc| {
            let priority = SCHEDULE_PHRASES.iter().any(|p| doc.text.contains(p))
                || BENGALI_DATE_PATTERN.is_match(&doc.text);
            (priority, doc)
        })
        .collect();
    flagged.sort_by(|a, b| {
        b.0.cmp(&a.0).then_with(|| {
            b.1.score
                .partial_cmp(&a.1.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    });
    flagged.into_iter().map(|(_, doc)| doc).collect()
}

/// Drop near-duplicates by Jaccard similarity over the token sets of each
/// passage's first `prefix_chars` characters. Earlier (higher-ranked) docs
/// survive.
pub fn dedupe_by_jaccard(docs: Vec<ScoredDoc>, threshold: f32, prefix_chars: usize) -> Vec<ScoredDoc> {
    let mut kept: Vec<ScoredDoc> = Vec::new();
    let mut kept_tokens: Vec<std::collections::HashSet<String>> = Vec::new();

    for doc in docs {
        let prefix: String = doc.text.chars().take(prefix_chars).collect();
        let tokens: std::collections::HashSet<String> = tokenize(&prefix).into_iter().collect();

        let duplicate = kept_tokens.iter().any(|existing| {
            let intersection = existing.intersection(&tokens).count();
            let union = existing.union(&tokens).count();
            union > 0 && intersection as f32 / union as f32 >= threshold
        });

        if !duplicate {
            kept.push(doc);
            kept_tokens.push(tokens);
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, text: &str, score: f32) -> ScoredDoc {
        ScoredDoc::new(id, text, score)
    }

    #[test]
    fn test_dedupe_drops_near_duplicates() {
        let docs = vec![
            doc("a", "কুয়েট ভর্তি পরীক্ষার তারিখ ১০ জানুয়ারি ২০২৬ সকাল দশটা", 0.9),
            doc("b", "কুয়েট ভর্তি পরীক্ষার তারিখ ১০ জানুয়ারি ২০২৬ সকাল দশটা", 0.8),
            doc("c", "ঢাকা বিশ্ববিদ্যালয় সম্পূর্ণ ভিন্ন একটি বিজ্ঞপ্তি নিয়ে এসেছে", 0.7),
        ];
        let kept = dedupe_by_jaccard(docs, 0.85, 500);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].id, "a");
        assert_eq!(kept[1].id, "c");
    }

    #[test]
    fn test_dedupe_keeps_distinct_docs() {
        let docs = vec![
            doc("a", "আবেদন ফি ১০০০ টাকা", 0.9),
            doc("b", "আসন সংখ্যা ১২০০ জন", 0.8),
        ];
        assert_eq!(dedupe_by_jaccard(docs, 0.85, 500).len(), 2);
    }

    #[test]
    fn test_schedule_prioritization() {
        let docs = vec![
            doc("plain", "সাধারণ ভর্তি তথ্য, কোনো নির্দিষ্ট দিন নেই", 0.95),
            doc("dated", "ভর্তি পরীক্ষার তারিখ ও সময় : ১০ জানুয়ারি ২০২৬", 0.5),
        ];
        let prioritized = prioritize_schedules(docs);
        assert_eq!(prioritized[0].id, "dated");
        assert_eq!(prioritized[1].id, "plain");
    }

    #[test]
    fn test_prioritization_stable_within_class() {
        let docs = vec![
            doc("d1", "পরীক্ষা ২১/১২/২০২৫ তারিখে", 0.9),
            doc("d2", "পরীক্ষা ২২/১২/২০২৫ তারিখে", 0.7),
        ];
        let prioritized = prioritize_schedules(docs);
        assert_eq!(prioritized[0].id, "d1");
    }
}
