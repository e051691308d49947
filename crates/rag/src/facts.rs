//! Fact matching and LLM relevance filtering
//!
//! Cosine against the fact embedding matrix proposes `linking_top_k`
//! candidate triples; the reasoning model filters them down to the facts that
//! actually bear on the question. The model's JSON is parsed tolerantly
//! (multilingual output gets truncated and mis-quoted often), and a parse
//! that yields nothing falls back to the unfiltered candidates so the graph
//! walk still has seeds.
//!
//! Facts the model echoes back are mapped to candidate indices by bounded
//! Levenshtein distance over the display form; ties go to the lowest
//! candidate index.

use serde::Deserialize;

use bhorti_config::domain::prompts;
use bhorti_core::Fact;
use bhorti_graph::FactIndex;
use bhorti_llm::{CachedChat, ChatMessage};

use crate::RagError;

/// Result of the match+filter stage.
#[derive(Debug, Clone, Default)]
pub struct FactFilterOutcome {
    /// Indices into the fact index, filter order.
    pub indices: Vec<usize>,
    /// The kept facts, aligned with `indices`.
    pub facts: Vec<Fact>,
    /// Max cosine score among the kept facts; drives adaptive fusion.
    pub confidence: f32,
    /// True when the LLM output was unusable and candidates passed through.
    pub fallback: bool,
}

pub struct FactMatcher {
    linking_top_k: usize,
    len_after_rerank: usize,
}

impl FactMatcher {
    pub fn new(linking_top_k: usize, len_after_rerank: usize) -> Self {
        Self {
            linking_top_k,
            len_after_rerank,
        }
    }

    /// Top `linking_top_k` fact indices by score, descending.
    pub fn candidates(&self, scores: &[f32]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..scores.len()).collect();
        order.sort_by(|&a, &b| {
            scores[b]
                .partial_cmp(&scores[a])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        order.truncate(self.linking_top_k);
        order
    }

    /// Run the full match + LLM filter stage.
    ///
    /// Gateway errors bubble (the chat wrapper already retried transients);
    /// parser failures never do — they degrade to the candidate list.
    pub async fn filter(
        &self,
        chat: &CachedChat,
        question: &str,
        fact_index: &FactIndex,
        scores: &[f32],
    ) -> Result<FactFilterOutcome, RagError> {
        let candidate_indices = self.candidates(scores);
        if candidate_indices.is_empty() {
            return Ok(FactFilterOutcome::default());
        }

        let candidates: Vec<&Fact> = candidate_indices
            .iter()
            .filter_map(|&i| fact_index.fact(i))
            .collect();

        let payload = serde_json::json!({
            "fact": candidates
                .iter()
                .map(|f| vec![f.subject.clone(), f.predicate.clone(), f.object.clone()])
                .collect::<Vec<_>>(),
        });

        let messages = ChatMessage::from_pairs(prompts::fact_filter_messages(
            question,
            &payload.to_string(),
        ));
        let (response, _meta) = chat.complete(&messages).await?;

        let generated = parse_fact_payload(&response);

        if generated.is_empty() {
            tracing::warn!(
                candidates = candidates.len(),
                "fact filter returned nothing usable, falling back to candidates"
            );
            let kept: Vec<usize> = candidate_indices
                .iter()
                .take(self.len_after_rerank)
                .copied()
                .collect();
            return Ok(self.outcome(kept, fact_index, scores, true));
        }

        // Map each generated fact back to the closest candidate.
        let displays: Vec<String> = candidates.iter().map(|f| f.as_display()).collect();
        let mut kept: Vec<usize> = Vec::new();
        for fact in &generated {
            if let Some(local) = closest_candidate(&fact.as_display(), &displays) {
                let global = candidate_indices[local];
                if !kept.contains(&global) {
                    kept.push(global);
                }
            }
        }
        kept.truncate(self.len_after_rerank);

        if kept.is_empty() {
            let fallback: Vec<usize> = candidate_indices
                .iter()
                .take(self.len_after_rerank)
                .copied()
                .collect();
            return Ok(self.outcome(fallback, fact_index, scores, true));
        }

        Ok(self.outcome(kept, fact_index, scores, false))
    }

    fn outcome(
        &self,
        indices: Vec<usize>,
        fact_index: &FactIndex,
        scores: &[f32],
        fallback: bool,
    ) -> FactFilterOutcome {
        let facts: Vec<Fact> = indices
            .iter()
            .filter_map(|&i| fact_index.fact(i).cloned())
            .collect();
        let confidence = indices
            .iter()
            .filter_map(|&i| scores.get(i))
            .cloned()
            .fold(0.0f32, f32::max);
        FactFilterOutcome {
            indices,
            facts,
            confidence,
            fallback,
        }
    }
}

#[derive(Deserialize)]
struct FactPayload {
    #[serde(default)]
    fact: Vec<Vec<String>>,
}

/// Parse the filter response tolerantly.
///
/// Order of attempts: strip code fences and isolate the outermost JSON
/// object; parse as-is; close unbalanced brackets (truncated responses);
/// retry with single quotes converted to double quotes.
pub fn parse_fact_payload(response: &str) -> Vec<Fact> {
    let body = isolate_json(response);
    if body.is_empty() {
        return Vec::new();
    }

    for candidate in [
        body.clone(),
        balance_brackets(&body),
        balance_brackets(&body.replace('\'', "\"")),
    ] {
        if let Ok(payload) = serde_json::from_str::<FactPayload>(&candidate) {
            return payload
                .fact
                .into_iter()
                .filter(|triple| triple.len() == 3)
                .map(|mut triple| {
                    let object = triple.pop().expect("len checked");
                    let predicate = triple.pop().expect("len checked");
                    let subject = triple.pop().expect("len checked");
                    Fact::new(subject, predicate, object)
                })
                .collect();
        }
    }
    Vec::new()
}

/// Cut everything outside the first `{` and the matching tail of the
/// response; drops markdown fences along the way.
fn isolate_json(response: &str) -> String {
    let cleaned = response
        .replace("```json", "")
        .replace("```", "");
    match cleaned.find('{') {
        Some(start) => {
            let tail = &cleaned[start..];
            match tail.rfind('}') {
                Some(end) => tail[..=end].to_string(),
                None => tail.to_string(),
            }
        }
        None => String::new(),
    }
}

/// Append missing closing brackets/braces to a truncated payload.
fn balance_brackets(body: &str) -> String {
    let mut out = body.trim_end().trim_end_matches(',').to_string();
    let open_sq = out.matches('[').count();
    let close_sq = out.matches(']').count();
    for _ in close_sq..open_sq {
        out.push(']');
    }
    let open_br = out.matches('{').count();
    let close_br = out.matches('}').count();
    for _ in close_br..open_br {
        out.push('}');
    }
    out
}

/// Levenshtein distance with an early-exit band: once the running minimum of
/// a row exceeds `limit`, the real distance cannot come back under it.
pub fn levenshtein_bounded(a: &str, b: &str, limit: usize) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > limit {
        return limit + 1;
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for (i, &ca) in a.iter().enumerate() {
        let mut current = vec![i + 1];
        let mut row_min = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            let value = (prev[j] + cost).min(prev[j + 1] + 1).min(current[j] + 1);
            row_min = row_min.min(value);
            current.push(value);
        }
        if row_min > limit {
            return limit + 1;
        }
        prev = current;
    }
    prev[b.len()]
}

/// Closest candidate by Levenshtein distance; lowest index wins ties.
/// `None` only when `candidates` is empty.
fn closest_candidate(target: &str, candidates: &[String]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    let mut limit = usize::MAX;
    for (idx, candidate) in candidates.iter().enumerate() {
        let bound = limit.min(target.len().max(candidate.len()));
        let distance = levenshtein_bounded(target, candidate, bound);
        match best {
            // Strictly-less keeps the lowest index on ties.
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => {
                best = Some((idx, distance));
                limit = distance;
            }
        }
    }
    best.map(|(idx, _)| idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clean_json() {
        let facts = parse_fact_payload(
            r#"{"fact": [["কুয়েট", "ভর্তি পরীক্ষার তারিখ", "১০ জানুয়ারি ২০২৬"]]}"#,
        );
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].subject, "কুয়েট");
    }

    #[test]
    fn test_parse_fenced_json() {
        let facts =
            parse_fact_payload("```json\n{\"fact\": [[\"a\", \"b\", \"c\"]]}\n```");
        assert_eq!(facts.len(), 1);
    }

    #[test]
    fn test_parse_truncated_json() {
        // Truncated mid-list: closing brackets are missing.
        let facts = parse_fact_payload(r#"{"fact": [["a", "b", "c"], ["d", "e", "f""#);
        assert_eq!(facts.len(), 2);
        assert_eq!(facts[1].object, "f");
    }

    #[test]
    fn test_parse_single_quoted_json() {
        let facts = parse_fact_payload(r#"{'fact': [['a', 'b', 'c']]}"#);
        assert_eq!(facts.len(), 1);
    }

    #[test]
    fn test_parse_garbage_is_empty() {
        assert!(parse_fact_payload("no json here").is_empty());
        assert!(parse_fact_payload("").is_empty());
    }

    #[test]
    fn test_malformed_triples_skipped() {
        let facts = parse_fact_payload(r#"{"fact": [["only", "two"], ["a", "b", "c"]]}"#);
        assert_eq!(facts.len(), 1);
    }

    #[test]
    fn test_levenshtein_basics() {
        assert_eq!(levenshtein_bounded("kitten", "sitting", 10), 3);
        assert_eq!(levenshtein_bounded("same", "same", 10), 0);
        assert_eq!(levenshtein_bounded("", "abc", 10), 3);
    }

    #[test]
    fn test_levenshtein_early_exit() {
        // Length gap alone exceeds the bound.
        assert_eq!(levenshtein_bounded("a", "aaaaaaaaaa", 3), 4);
        // Band exit during the scan.
        assert!(levenshtein_bounded("abcdefgh", "zyxwvuts", 2) > 2);
    }

    #[test]
    fn test_closest_candidate_lowest_index_on_tie() {
        let candidates = vec!["abcd".to_string(), "abcd".to_string()];
        assert_eq!(closest_candidate("abce", &candidates), Some(0));
    }

    #[test]
    fn test_candidate_selection_order() {
        let matcher = FactMatcher::new(3, 2);
        let selected = matcher.candidates(&[0.1, 0.9, 0.5, 0.7]);
        assert_eq!(selected, vec![1, 3, 2]);
    }

    mod filter_flow {
        use super::*;
        use async_trait::async_trait;
        use bhorti_graph::EmbeddingStore;
        use bhorti_llm::{
            backend::{ChatModel, CompletionMeta, CompletionParams},
            CachedChat, GatewayError,
        };
        use std::sync::Arc;
        use std::time::Duration;

        struct Scripted {
            response: String,
        }

        #[async_trait]
        impl ChatModel for Scripted {
            async fn complete(
                &self,
                _messages: &[ChatMessage],
                _params: CompletionParams,
            ) -> Result<(String, CompletionMeta), GatewayError> {
                Ok((self.response.clone(), CompletionMeta::default()))
            }

            fn model_name(&self) -> &str {
                "scripted"
            }
        }

        fn chat(response: &str) -> CachedChat {
            CachedChat::new(
                Arc::new(Scripted {
                    response: response.to_string(),
                }),
                None,
                None,
                CompletionParams::default(),
                0,
                Duration::from_millis(1),
            )
        }

        fn index() -> FactIndex {
            let facts = vec![
                Fact::new("কুয়েট", "ভর্তি পরীক্ষার তারিখ", "১০ জানুয়ারি ২০২৬"),
                Fact::new("ঢাবি", "আবেদন ফি", "১০০০ টাকা"),
                Fact::new("কুয়েট", "অবস্থিত", "খুলনা"),
            ];
            let store = EmbeddingStore::from_rows(
                facts.iter().map(|f| f.id()).collect(),
                vec![
                    vec![1.0, 0.0],
                    vec![0.0, 1.0],
                    vec![0.5, 0.5],
                ],
                2,
            )
            .unwrap();
            FactIndex::new(facts, store).unwrap()
        }

        #[tokio::test]
        async fn test_filter_keeps_llm_selection() {
            let matcher = FactMatcher::new(3, 5);
            let chat = chat(
                r#"{"fact": [["কুয়েট", "ভর্তি পরীক্ষার তারিখ", "১০ জানুয়ারি ২০২৬"]]}"#,
            );
            let outcome = matcher
                .filter(&chat, "কুয়েটের পরীক্ষা কবে?", &index(), &[0.9, 0.2, 0.4])
                .await
                .unwrap();
            assert!(!outcome.fallback);
            assert_eq!(outcome.facts.len(), 1);
            assert_eq!(outcome.indices, vec![0]);
            assert!((outcome.confidence - 0.9).abs() < 1e-6);
        }

        #[tokio::test]
        async fn test_filter_falls_back_on_garbage() {
            let matcher = FactMatcher::new(3, 2);
            let chat = chat("I cannot answer that.");
            let outcome = matcher
                .filter(&chat, "প্রশ্ন", &index(), &[0.9, 0.2, 0.4])
                .await
                .unwrap();
            assert!(outcome.fallback);
            // Candidate order preserved, capped at len_after_rerank.
            assert_eq!(outcome.indices, vec![0, 2]);
        }

        #[tokio::test]
        async fn test_filter_empty_scores() {
            let matcher = FactMatcher::new(3, 2);
            let chat = chat("{}");
            let outcome = matcher
                .filter(&chat, "প্রশ্ন", &FactIndex::empty(2), &[])
                .await
                .unwrap();
            assert!(outcome.facts.is_empty());
            assert_eq!(outcome.confidence, 0.0);
        }
    }
}
