//! Retrieval engine and pipeline controller
//!
//! [`RetrievalEngine`] is an explicit value constructed once at startup and
//! shared by reference into request handlers — no process-wide singleton. It
//! owns the read-only artifacts (graph, embedding stores, fact index, BM25)
//! and the model registry.
//!
//! [`QueryPipeline`] drives the request flow:
//!
//! ```text
//! clarity check → maybe rewrite
//! coaching short-circuit → canned response
//! detect entities + intent
//! multi:  decompose → parallel retrieve → slot-aware synthesis
//! single: expand → DPR (+PPR when facts match) → strict filter →
//!         cross-encoder rerank → grounded synthesis
//! not-found check → references
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use bhorti_config::constants::retrieval::{REFERENCE_MAX_CHARS, STRICT_FILTER_MIN_DOCS};
use bhorti_config::domain::universities::COACHING_ABBREV;
use bhorti_config::domain::{answer_is_not_found, classify_not_found, notfound};
use bhorti_config::Settings;
use bhorti_core::{ids, DetectedEntity, Error, Intent, QueryResult, Reference, RetrievalMode};
use bhorti_graph::{
    ArtifactPaths, EmbeddingStore, FactIndex, GraphStats, KnowledgeGraph, PprEngine, PprSettings,
};
use bhorti_llm::ModelRegistry;
use bhorti_rag::{
    adaptive_fuse, min_max_normalize, strict_university_filter, Bm25Index, CrossEncoderStage,
    DenseRetriever, FactMatcher, ScoredDoc,
};

use crate::clarity::{is_unclear, ClarityRewriter};
use crate::date_extract::extract_exam_date_regex;
use crate::decompose::Decomposer;
use crate::detect::{detect_entities, detect_intent, is_coaching_query};
use crate::expand::expand_query;
use crate::orchestrator::{EntityRetrieval, MultiEntityOrchestrator};
use crate::synthesize::Synthesizer;

/// The response envelope for `/ask`.
#[derive(Debug, Clone, Serialize)]
pub struct AskOutcome {
    /// The user's question, verbatim — even when a rewrite drove retrieval.
    pub question: String,
    pub answer: String,
    pub references: Vec<Reference>,
}

/// Diagnostic payload for `/debug-retrieval`.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievalDebug {
    pub question: String,
    pub working_query: String,
    pub intent: String,
    pub entities: Vec<String>,
    pub mode: Option<String>,
    pub total_retrieved: usize,
    pub retrieved: Vec<DebugPassage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DebugPassage {
    pub rank: usize,
    pub score: f32,
    pub content: String,
}

/// Read-only retrieval state shared by all requests.
pub struct RetrievalEngine {
    settings: Settings,
    registry: Arc<ModelRegistry>,
    graph: KnowledgeGraph,
    fact_index: FactIndex,
    bm25: Bm25Index,
    dense: DenseRetriever,
    matcher: FactMatcher,
    ppr: PprEngine,
    cross_encoder: CrossEncoderStage,
    /// passage id → text, extracted from the graph's chunk nodes.
    passages: HashMap<String, String>,
}

impl RetrievalEngine {
    /// Assemble an engine from already-loaded artifacts.
    pub fn new(
        settings: Settings,
        registry: Arc<ModelRegistry>,
        graph: KnowledgeGraph,
        passage_store: EmbeddingStore,
        fact_index: FactIndex,
        bm25: Bm25Index,
    ) -> Result<Self, Error> {
        graph.validate().map_err(bhorti_core::Error::from)?;

        let passages: HashMap<String, String> = graph
            .passage_nodes()
            .iter()
            .filter_map(|&idx| {
                let vertex = graph.vertex(idx)?;
                let content = vertex.content.clone()?;
                Some((vertex.hash_id.clone(), content))
            })
            .collect();

        let matcher = FactMatcher::new(
            settings.retrieval.linking_top_k,
            settings.retrieval.len_after_rerank,
        );
        let ppr = PprEngine::new(PprSettings {
            damping: settings.retrieval.damping,
            ..PprSettings::default()
        });
        let cross_encoder = CrossEncoderStage::new(registry.reranker.clone());
        let dense = DenseRetriever::new(Arc::new(passage_store));

        Ok(Self {
            settings,
            registry,
            graph,
            fact_index,
            bm25,
            dense,
            matcher,
            ppr,
            cross_encoder,
            passages,
        })
    }

    /// Load an engine from the persisted artifacts under `save_dir`.
    pub fn load(settings: Settings, registry: Arc<ModelRegistry>) -> Result<Self, Error> {
        let paths = ArtifactPaths::new(&settings.paths.save_dir);
        if !paths.index_exists() {
            return Err(Error::IndexNotLoaded);
        }

        let graph = KnowledgeGraph::load(&paths.graph()).map_err(bhorti_core::Error::from)?;
        let passage_store =
            EmbeddingStore::load(&paths.passage_store()).map_err(bhorti_core::Error::from)?;

        let fact_index = if paths.facts().exists() && paths.fact_store().exists() {
            FactIndex::load(&paths.facts(), &paths.fact_store())
                .map_err(bhorti_core::Error::from)?
        } else {
            FactIndex::empty(passage_store.dim())
        };

        let bm25 = if paths.bm25().exists() {
            Bm25Index::load(&paths.bm25()).map_err(bhorti_core::Error::from)?
        } else {
            // Rebuild from the graph's chunk contents when the artifact is
            // missing (older index layouts).
            let docs: Vec<(String, String)> = graph
                .passage_nodes()
                .iter()
                .filter_map(|&idx| {
                    let vertex = graph.vertex(idx)?;
                    Some((vertex.hash_id.clone(), vertex.content.clone()?))
                })
                .collect();
            Bm25Index::build(docs.iter().map(|(id, text)| (id.as_str(), text.as_str())))
        };

        Self::new(settings, registry, graph, passage_store, fact_index, bm25)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn indexed_docs(&self) -> usize {
        self.passages.len()
    }

    pub fn graph_stats(&self) -> GraphStats {
        self.graph.stats()
    }

    pub(crate) fn rrf_k(&self) -> f32 {
        self.settings.retrieval.rrf_k
    }

    pub(crate) async fn embed_one(&self, text: &str) -> Result<Vec<f32>, Error> {
        let mut vectors = self
            .registry
            .embedding
            .embed(&[text.to_string()])
            .await
            .map_err(bhorti_core::Error::from)?;
        vectors
            .pop()
            .ok_or_else(|| Error::Gateway("embedding backend returned nothing".to_string()))
    }

    pub(crate) fn dense_rank(&self, embedding: &[f32]) -> Result<Vec<(String, f32)>, Error> {
        self.dense.rank(embedding).map_err(bhorti_core::Error::from)
    }

    pub(crate) fn bm25_search(&self, query: &str, top_k: usize) -> Vec<(String, f32)> {
        self.bm25.search(query, Some(top_k))
    }

    pub(crate) fn to_scored_docs(&self, ranked: &[(String, f32)]) -> Vec<ScoredDoc> {
        ranked
            .iter()
            .filter_map(|(id, score)| {
                self.passages
                    .get(id)
                    .map(|text| ScoredDoc::new(id.clone(), text.clone(), *score))
            })
            .collect()
    }

    /// Single-entity hybrid retrieval: DPR always; PPR blended in when the
    /// fact filter kept anything and produced a usable seed.
    async fn retrieve_single(
        &self,
        working_query: &str,
        expanded_query: &str,
        intent: Intent,
    ) -> Result<QueryResult, Error> {
        let embedding = self.embed_one(expanded_query).await?;
        let dpr = self.dense_rank(&embedding)?;

        let fact_scores = if self.fact_index.is_empty() {
            Vec::new()
        } else {
            self.fact_index
                .scores(&embedding)
                .map_err(bhorti_core::Error::from)?
        };

        let outcome = self
            .matcher
            .filter(
                &self.registry.reasoning,
                working_query,
                &self.fact_index,
                &fact_scores,
            )
            .await
            .map_err(bhorti_core::Error::from)?;

        if outcome.facts.is_empty() {
            return Ok(QueryResult {
                question: working_query.to_string(),
                candidate_passages: dpr,
                matched_facts: Vec::new(),
                query_entities: Vec::new(),
                intent,
                mode: RetrievalMode::DprOnly,
            });
        }

        let (seed, query_entities) = self.build_seed(&outcome.indices, &fact_scores, &dpr);
        if seed.iter().all(|&w| w <= 0.0) {
            tracing::debug!("PPR seed empty despite matched facts, using DPR only");
            return Ok(QueryResult {
                question: working_query.to_string(),
                candidate_passages: dpr,
                matched_facts: outcome.facts,
                query_entities,
                intent,
                mode: RetrievalMode::DprOnly,
            });
        }

        let scores = self
            .ppr
            .run(&self.graph, &seed)
            .map_err(bhorti_core::Error::from)?;
        let ppr_ranked = self.ppr_passage_ranking(&scores);
        let fused = adaptive_fuse(&ppr_ranked, &dpr, outcome.confidence);

        Ok(QueryResult {
            question: working_query.to_string(),
            candidate_passages: fused,
            matched_facts: outcome.facts,
            query_entities,
            intent,
            mode: RetrievalMode::HybridPprDpr,
        })
    }

    /// Build the PPR seed vector.
    ///
    /// Entity side: each kept fact contributes its score to its subject and
    /// object entity nodes, scaled by the inverse of the entity's chunk
    /// frequency, then averaged over occurrences. Passage side: min-max
    /// normalized DPR scores scaled by `passage_node_weight`.
    fn build_seed(
        &self,
        kept_indices: &[usize],
        fact_scores: &[f32],
        dpr: &[(String, f32)],
    ) -> (Vec<f64>, Vec<String>) {
        let n = self.graph.vertex_count();
        let mut phrase_weights = vec![0.0f64; n];
        let mut occurrences = vec![0usize; n];
        let mut query_entities: Vec<String> = Vec::new();

        for &fact_idx in kept_indices {
            let Some(fact) = self.fact_index.fact(fact_idx) else {
                continue;
            };
            let fact_score = fact_scores.get(fact_idx).copied().unwrap_or(0.0) as f64;
            for phrase in [&fact.subject, &fact.object] {
                let key = ids::entity_id(phrase);
                let Some(node) = self.graph.vertex_index(&key) else {
                    continue;
                };
                let lowered = phrase.to_lowercase();
                if !query_entities.contains(&lowered) {
                    query_entities.push(lowered);
                }
                let chunk_count = self.graph.passage_neighbor_count(node);
                let weighted = if chunk_count > 0 {
                    fact_score / chunk_count as f64
                } else {
                    fact_score
                };
                phrase_weights[node as usize] += weighted;
                occurrences[node as usize] += 1;
            }
        }
        for i in 0..n {
            if occurrences[i] > 0 {
                phrase_weights[i] /= occurrences[i] as f64;
            }
        }

        let mut dpr_scores: Vec<f32> = dpr.iter().map(|(_, s)| *s).collect();
        min_max_normalize(&mut dpr_scores);
        let passage_node_weight = self.settings.retrieval.passage_node_weight;
        for ((id, _), normalized) in dpr.iter().zip(dpr_scores) {
            if let Some(node) = self.graph.vertex_index(id) {
                phrase_weights[node as usize] += normalized as f64 * passage_node_weight;
            }
        }

        for weight in phrase_weights.iter_mut() {
            if weight.is_nan() || *weight < 0.0 {
                *weight = 0.0;
            }
        }
        (phrase_weights, query_entities)
    }

    /// Extract per-passage PageRank mass, ranked descending.
    fn ppr_passage_ranking(&self, scores: &[f64]) -> Vec<(String, f32)> {
        let mut ranked: Vec<(String, f32)> = self
            .graph
            .passage_nodes()
            .iter()
            .filter_map(|&idx| {
                let vertex = self.graph.vertex(idx)?;
                Some((vertex.hash_id.clone(), scores[idx as usize] as f32))
            })
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}

/// The top-level request controller.
pub struct QueryPipeline {
    engine: Arc<RetrievalEngine>,
}

impl QueryPipeline {
    pub fn new(engine: Arc<RetrievalEngine>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &Arc<RetrievalEngine> {
        &self.engine
    }

    /// Answer a question end to end.
    pub async fn ask(
        &self,
        question: &str,
        language_instruction: Option<&str>,
    ) -> Result<AskOutcome, Error> {
        let original = question.trim();
        if original.is_empty() {
            return Err(Error::InvalidInput("empty question".to_string()));
        }
        let start = Instant::now();

        // Clarity gate: unclear queries get one rewrite attempt; the
        // original always survives into the envelope.
        let mut working = original.to_string();
        if is_unclear(&working) {
            working = ClarityRewriter::rewrite(&self.engine.registry.reasoning, &working)
                .await
                .map_err(bhorti_core::Error::from)?;
        }

        // Coaching questions never reach retrieval; there is no coaching
        // corpus to search.
        if is_coaching_query(original) || is_coaching_query(&working) {
            tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "coaching short-circuit");
            return Ok(AskOutcome {
                question: original.to_string(),
                answer: notfound::coaching_response(),
                references: Vec::new(),
            });
        }

        let entities = detect_entities(&working);
        let intent = detect_intent(&working);
        tracing::debug!(
            intent = intent.as_str(),
            entities = ?entities.iter().map(|e| e.abbrev.as_str()).collect::<Vec<_>>(),
            "query understood"
        );

        let outcome = if entities.len() > 1 {
            self.ask_multi(original, &working, &entities, intent, language_instruction)
                .await?
        } else {
            self.ask_single(
                original,
                &working,
                entities.first(),
                intent,
                language_instruction,
            )
            .await?
        };

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            intent = intent.as_str(),
            references = outcome.references.len(),
            "ask completed"
        );
        Ok(outcome)
    }

    async fn ask_single(
        &self,
        original: &str,
        working: &str,
        entity: Option<&DetectedEntity>,
        intent: Intent,
        language_instruction: Option<&str>,
    ) -> Result<AskOutcome, Error> {
        let engine = &self.engine;
        let expanded = expand_query(working, intent);
        let retrieval = engine.retrieve_single(working, &expanded, intent).await?;
        tracing::debug!(
            mode = retrieval.mode.as_str(),
            facts = retrieval.matched_facts.len(),
            entities = ?retrieval.query_entities,
            "single-entity retrieval done"
        );

        let mut docs = engine.to_scored_docs(&retrieval.candidate_passages);
        if let Some(entity) = entity {
            docs = strict_university_filter(docs, &entity.abbrev, STRICT_FILTER_MIN_DOCS);
            if docs.is_empty() && entity.abbrev == COACHING_ABBREV {
                return Ok(AskOutcome {
                    question: original.to_string(),
                    answer: notfound::coaching_response(),
                    references: Vec::new(),
                });
            }
        }

        let top_k = engine.settings.retrieval.retrieval_top_k;
        let candidates: Vec<ScoredDoc> = docs.into_iter().take(2 * top_k).collect();
        let final_docs = engine.cross_encoder.rerank(working, candidates, top_k).await;

        // Deterministic date extraction runs before the model; a hit becomes
        // ground truth the prompt asks the model to echo.
        let extracted_date = if intent == Intent::Date {
            entity.and_then(|e| extract_exam_date_regex(&e.abbrev, &final_docs))
        } else {
            None
        };

        let answer = if final_docs.is_empty() {
            String::new()
        } else {
            Synthesizer::answer_single(
                &engine.registry.answer,
                working,
                &final_docs,
                language_instruction,
                extracted_date.as_deref(),
            )
            .await
            .map_err(bhorti_core::Error::from)?
        };

        if final_docs.is_empty() || answer_is_not_found(&answer) {
            let category = classify_not_found(working, entity.map(|e| e.abbrev.as_str()));
            return Ok(AskOutcome {
                question: original.to_string(),
                answer: notfound::response(category, entity.map(|e| e.abbrev.as_str())),
                references: Vec::new(),
            });
        }

        let min_score = engine.settings.retrieval.min_reference_score;
        let references = final_docs
            .iter()
            .filter(|doc| doc.score >= min_score)
            .take(engine.settings.retrieval.max_references)
            .map(|doc| Reference::truncated(&doc.text, doc.score, REFERENCE_MAX_CHARS))
            .collect();

        Ok(AskOutcome {
            question: original.to_string(),
            answer,
            references,
        })
    }

    async fn ask_multi(
        &self,
        original: &str,
        working: &str,
        entities: &[DetectedEntity],
        intent: Intent,
        language_instruction: Option<&str>,
    ) -> Result<AskOutcome, Error> {
        let engine = &self.engine;
        let subs = Decomposer::decompose(&engine.registry.reasoning, working, entities)
            .await
            .map_err(bhorti_core::Error::from)?;

        let orchestrator = MultiEntityOrchestrator::new(self.engine.clone());
        let mut results_map = orchestrator.retrieve_all(subs.clone(), intent).await?;

        // Preserve the decomposition order for context blocks.
        let ordered: Vec<EntityRetrieval> = subs
            .iter()
            .filter_map(|sub| results_map.remove(&sub.abbrev))
            .collect();

        if ordered.iter().all(|entity| entity.docs.is_empty()) {
            let category = classify_not_found(working, entities.first().map(|e| e.abbrev.as_str()));
            return Ok(AskOutcome {
                question: original.to_string(),
                answer: notfound::response(category, entities.first().map(|e| e.abbrev.as_str())),
                references: Vec::new(),
            });
        }

        let answer = Synthesizer::answer_multi(
            &engine.registry.answer,
            working,
            &ordered,
            intent == Intent::Date,
            language_instruction,
        )
        .await
        .map_err(bhorti_core::Error::from)?;

        if answer_is_not_found(&answer) {
            let category = classify_not_found(working, entities.first().map(|e| e.abbrev.as_str()));
            return Ok(AskOutcome {
                question: original.to_string(),
                answer: notfound::response(category, entities.first().map(|e| e.abbrev.as_str())),
                references: Vec::new(),
            });
        }

        // RRF magnitudes are tiny; displayed scores get a floor so the
        // envelope stays comparable with the single-entity scale. The floor
        // is applied only here, at the display edge.
        let floor = engine.settings.retrieval.multi_display_floor;
        let mut references: Vec<Reference> = ordered
            .iter()
            .flat_map(|entity| entity.docs.iter())
            .map(|doc| Reference::truncated(&doc.text, doc.score.max(floor), REFERENCE_MAX_CHARS))
            .collect();
        references.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        references.truncate(engine.settings.retrieval.max_references);

        Ok(AskOutcome {
            question: original.to_string(),
            answer,
            references,
        })
    }

    /// Retrieval-only diagnostics: same understanding and ranking stages as
    /// `ask`, no synthesis.
    pub async fn debug_retrieval(&self, question: &str) -> Result<RetrievalDebug, Error> {
        let original = question.trim();
        if original.is_empty() {
            return Err(Error::InvalidInput("empty question".to_string()));
        }

        let mut working = original.to_string();
        if is_unclear(&working) {
            working = ClarityRewriter::rewrite(&self.engine.registry.reasoning, &working)
                .await
                .map_err(bhorti_core::Error::from)?;
        }
        let entities = detect_entities(&working);
        let intent = detect_intent(&working);

        let (mode, docs) = if entities.len() > 1 {
            let subs = Decomposer::decompose(&self.engine.registry.reasoning, &working, &entities)
                .await
                .map_err(bhorti_core::Error::from)?;
            let orchestrator = MultiEntityOrchestrator::new(self.engine.clone());
            let results = orchestrator.retrieve_all(subs, intent).await?;
            let docs: Vec<ScoredDoc> = results
                .into_values()
                .flat_map(|entity| entity.docs)
                .collect();
            (None, docs)
        } else {
            let expanded = expand_query(&working, intent);
            let retrieval = self
                .engine
                .retrieve_single(&working, &expanded, intent)
                .await?;
            (
                Some(retrieval.mode.as_str().to_string()),
                self.engine.to_scored_docs(&retrieval.candidate_passages),
            )
        };

        let retrieved: Vec<DebugPassage> = docs
            .iter()
            .take(20)
            .enumerate()
            .map(|(i, doc)| DebugPassage {
                rank: i + 1,
                score: doc.score,
                content: doc.text.clone(),
            })
            .collect();

        Ok(RetrievalDebug {
            question: original.to_string(),
            working_query: working,
            intent: intent.as_str().to_string(),
            entities: entities.into_iter().map(|e| e.abbrev).collect(),
            mode,
            total_retrieved: docs.len(),
            retrieved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bhorti_core::Fact;
    use bhorti_llm::backend::{
        ChatModel, CompletionMeta, CompletionParams, EmbeddingModel,
    };
    use bhorti_llm::{CachedChat, ChatMessage, GatewayError};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const DIM: usize = 16;

    /// Deterministic token-bucket embedding: shared tokens → shared axes.
    fn fake_embed(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; DIM];
        for token in bhorti_rag::bm25::tokenize(text) {
            let mut h: u64 = 1469598103934665603;
            for b in token.as_bytes() {
                h ^= *b as u64;
                h = h.wrapping_mul(1099511628211);
            }
            v[(h % DIM as u64) as usize] += 1.0;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in v.iter_mut() {
                *x /= norm;
            }
        }
        v
    }

    struct FakeEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingModel for FakeEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| fake_embed(t)).collect())
        }

        fn dim(&self) -> usize {
            DIM
        }
    }

    /// Routes scripted responses by inspecting the final user message.
    struct RouterChat {
        last_user: Mutex<Vec<String>>,
        rewrites: AtomicUsize,
    }

    impl RouterChat {
        fn new() -> Self {
            Self {
                last_user: Mutex::new(Vec::new()),
                rewrites: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChatModel for RouterChat {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _params: CompletionParams,
        ) -> Result<(String, CompletionMeta), GatewayError> {
            let user = messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            self.last_user.lock().push(user.clone());

            let response = if user.contains("Candidate facts:") {
                // Keep every candidate: echo the payload back.
                let start = user.find("Candidate facts:").unwrap() + "Candidate facts:".len();
                user[start..].trim().to_string()
            } else if user.starts_with("Universities:") {
                // One line per listed entity.
                user.lines()
                    .filter_map(|line| line.strip_prefix("- "))
                    .filter_map(|line| line.split_once(" = "))
                    .map(|(abbrev, full)| format!("{}|{} fee?", abbrev, full))
                    .collect::<Vec<_>>()
                    .join("\n")
            } else if user.starts_with("Query:") {
                self.rewrites.fetch_add(1, Ordering::SeqCst);
                "ভর্তি পরীক্ষার তারিখ কবে?".to_string()
            } else if user.contains("মেডিকেল") {
                format!("Thought: nothing relevant.\nAnswer: {}", bhorti_config::domain::prompts::NOT_FOUND_ANSWER)
            } else if user.contains("VERIFIED") {
                "Thought: echoing verified date.\nAnswer: চবির ভর্তি পরীক্ষা **৫ জানুয়ারি ২০২৬** তারিখে অনুষ্ঠিত হবে।".to_string()
            } else {
                "Thought: context answers it.\nAnswer: তথ্যটি উপরের প্যাসেজে আছে।".to_string()
            };
            Ok((response, CompletionMeta::default()))
        }

        fn model_name(&self) -> &str {
            "router"
        }
    }

    struct Corpus {
        engine: Arc<RetrievalEngine>,
        chat: Arc<RouterChat>,
        embedder: Arc<FakeEmbedder>,
    }

    fn passages() -> Vec<(&'static str, &'static str)> {
        vec![
            (
                "cu_date",
                "[চট্টগ্রাম বিশ্ববিদ্যালয় CU] চট্টগ্রাম বিশ্ববিদ্যালয় D1 উপ-ইউনিট। চবি ভর্তি পরীক্ষা ৫ জানুয়ারি ২০২৬ তারিখে অনুষ্ঠিত হবে।",
            ),
            (
                "ku_seat",
                "[খুলনা বিশ্ববিদ্যালয় KU] খুলনা বিশ্ববিদ্যালয় ভর্তি: আসন সংখ্যা ১২০০। খুবি ক্যাম্পাসে পরীক্ষা হবে।",
            ),
            (
                "kuet_date",
                "[খুলনা প্রকৌশল ও প্রযুক্তি বিশ্ববিদ্যালয় KUET] কুয়েট ভর্তি পরীক্ষার তারিখ ও সময় : ১০ জানুয়ারি ২০২৬। আবেদন ফি ১২০০ টাকা।",
            ),
            (
                "buet_fee",
                "[বাংলাদেশ প্রকৌশল বিশ্ববিদ্যালয় BUET] বুয়েট আবেদন ফি ১০০০ টাকা। পরীক্ষার তারিখ: ২৪ জানুয়ারি ২০২৬ (শনিবার)",
            ),
            (
                "ruet_fee",
                "[রাজশাহী প্রকৌশল ও প্রযুক্তি বিশ্ববিদ্যালয় RUET] রুয়েট আবেদন ফি ১১০০ টাকা। ভর্তি পরীক্ষার তারিখ ও সময় : ১২ জানুয়ারি ২০২৬",
            ),
        ]
    }

    fn build_corpus() -> Corpus {
        use bhorti_graph::Vertex;

        let mut graph = KnowledgeGraph::new();
        let mut passage_ids = Vec::new();
        let mut passage_vecs = Vec::new();

        let entity_phrases = ["চবি", "খুবি", "কুয়েট", "বুয়েট", "রুয়েট"];
        let passage_entity: Vec<usize> = vec![0, 1, 2, 3, 4];

        let mut entity_nodes = Vec::new();
        for phrase in entity_phrases {
            let idx = graph
                .add_vertex(Vertex {
                    name: phrase.to_string(),
                    hash_id: ids::entity_id(phrase),
                    content: None,
                })
                .unwrap();
            entity_nodes.push(idx);
        }

        for (i, (_, text)) in passages().iter().enumerate() {
            let id = ids::passage_id(text);
            let node = graph
                .add_vertex(Vertex {
                    name: id.clone(),
                    hash_id: id.clone(),
                    content: Some(text.to_string()),
                })
                .unwrap();
            graph
                .add_edge(node, entity_nodes[passage_entity[i]], 1.0)
                .unwrap();
            passage_ids.push(id);
            passage_vecs.push(fake_embed(text));
        }

        let passage_store =
            EmbeddingStore::from_rows(passage_ids.clone(), passage_vecs, DIM).unwrap();

        let facts = vec![
            Fact::new("চবি", "ভর্তি পরীক্ষার তারিখ", "৫ জানুয়ারি ২০২৬"),
            Fact::new("কুয়েট", "আবেদন ফি", "১২০০ টাকা"),
            Fact::new("বুয়েট", "আবেদন ফি", "১০০০ টাকা"),
        ];
        let fact_store = EmbeddingStore::from_rows(
            facts.iter().map(|f| f.id()).collect(),
            facts
                .iter()
                .map(|f| fake_embed(&format!("{} {} {}", f.subject, f.predicate, f.object)))
                .collect(),
            DIM,
        )
        .unwrap();
        let fact_index = FactIndex::new(facts, fact_store).unwrap();

        let bm25 = Bm25Index::build(
            passages()
                .iter()
                .enumerate()
                .map(|(i, (_, text))| (passage_ids[i].as_str(), *text))
                .collect::<Vec<_>>(),
        );

        let chat = Arc::new(RouterChat::new());
        let embedder = Arc::new(FakeEmbedder {
            calls: AtomicUsize::new(0),
        });

        let make_chat = |backend: Arc<RouterChat>| {
            CachedChat::new(
                backend,
                None,
                None,
                CompletionParams::default(),
                0,
                Duration::from_millis(1),
            )
        };

        let registry = Arc::new(ModelRegistry::from_parts(
            make_chat(chat.clone()),
            make_chat(chat.clone()),
            embedder.clone(),
            None,
        ));

        let engine = RetrievalEngine::new(
            Settings::default(),
            registry,
            graph,
            passage_store,
            fact_index,
            bm25,
        )
        .unwrap();

        Corpus {
            engine: Arc::new(engine),
            chat,
            embedder,
        }
    }

    #[tokio::test]
    async fn test_single_entity_date_query() {
        let corpus = build_corpus();
        let pipeline = QueryPipeline::new(corpus.engine.clone());

        let outcome = pipeline
            .ask("চবির পরীক্ষার তারিখ কবে?", None)
            .await
            .unwrap();

        assert!(outcome.answer.contains("৫ জানুয়ারি ২০২৬"));
        assert!(!outcome.references.is_empty());
        // The deterministic extractor's date was injected into the prompt.
        let prompts = corpus.chat.last_user.lock();
        assert!(prompts
            .iter()
            .any(|p| p.contains("VERIFIED") && p.contains("৫ জানুয়ারি ২০২৬")));
        // References are sorted descending.
        for pair in outcome.references.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[tokio::test]
    async fn test_multi_entity_fee_query() {
        let corpus = build_corpus();
        let pipeline = QueryPipeline::new(corpus.engine.clone());

        let outcome = pipeline
            .ask("BUET, KUET, RUET এর আবেদন ফি কত?", None)
            .await
            .unwrap();

        // Slot-aware synthesis got three labeled blocks.
        let prompts = corpus.chat.last_user.lock();
        let multi_prompt = prompts
            .iter()
            .find(|p| p.contains("==="))
            .expect("multi-entity prompt sent");
        assert!(multi_prompt.contains("(BUET)"));
        assert!(multi_prompt.contains("(KUET)"));
        assert!(multi_prompt.contains("(RUET)"));

        assert!(!outcome.references.is_empty());
        assert!(outcome.references.len() <= 10);
        // Display floor applied to RRF-scale scores.
        for reference in &outcome.references {
            assert!(reference.score >= 0.5);
        }
    }

    #[tokio::test]
    async fn test_coaching_short_circuit_skips_retrieval() {
        let corpus = build_corpus();
        let pipeline = QueryPipeline::new(corpus.engine.clone());

        let outcome = pipeline
            .ask("উদ্ভাস ব্যাচের সময় কখন?", None)
            .await
            .unwrap();

        assert!(outcome.answer.contains("udvash.com/HomePage"));
        assert!(outcome.references.is_empty());
        assert_eq!(corpus.embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unclear_query_rewritten_envelope_keeps_original() {
        let corpus = build_corpus();
        let pipeline = QueryPipeline::new(corpus.engine.clone());

        let outcome = pipeline.ask("eta ki?", None).await.unwrap();

        assert_eq!(outcome.question, "eta ki?");
        assert_eq!(corpus.chat.rewrites.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ku_filter_excludes_kuet() {
        let corpus = build_corpus();
        let pipeline = QueryPipeline::new(corpus.engine.clone());

        let outcome = pipeline.ask("KU এর আসন কত?", None).await.unwrap();

        // The grounded-QA context must contain the KU passage and never the
        // KUET one.
        let prompts = corpus.chat.last_user.lock();
        let qa_prompt = prompts
            .iter()
            .find(|p| p.contains("Question: KU") && p.contains("Passage:"))
            .expect("grounded QA prompt sent");
        assert!(qa_prompt.contains("আসন সংখ্যা ১২০০"));
        assert!(!qa_prompt.contains("কুয়েট"));

        for reference in &outcome.references {
            assert!(
                !reference.content.contains("কুয়েট"),
                "KUET passage leaked into KU references: {}",
                reference.content
            );
        }
    }

    #[tokio::test]
    async fn test_medical_not_found_category() {
        let corpus = build_corpus();
        let pipeline = QueryPipeline::new(corpus.engine.clone());

        let outcome = pipeline.ask("মেডিকেল ভর্তির তারিখ?", None).await.unwrap();

        assert!(outcome.answer.contains("dghs.gov.bd"));
        assert!(outcome.references.is_empty());
    }

    #[tokio::test]
    async fn test_empty_question_rejected_without_model_calls() {
        let corpus = build_corpus();
        let pipeline = QueryPipeline::new(corpus.engine.clone());

        let result = pipeline.ask("   ", None).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(corpus.embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_reference_content_capped() {
        let corpus = build_corpus();
        let pipeline = QueryPipeline::new(corpus.engine.clone());

        let outcome = pipeline
            .ask("চবির পরীক্ষার তারিখ কবে?", None)
            .await
            .unwrap();
        for reference in &outcome.references {
            assert!(reference.content.chars().count() <= REFERENCE_MAX_CHARS + 1);
        }
    }

    #[tokio::test]
    async fn test_debug_retrieval_reports_mode() {
        let corpus = build_corpus();
        let pipeline = QueryPipeline::new(corpus.engine.clone());

        let debug = pipeline
            .debug_retrieval("চবির পরীক্ষার তারিখ কবে?")
            .await
            .unwrap();
        assert_eq!(debug.intent, "date");
        assert_eq!(debug.entities, vec!["cu"]);
        assert!(debug.mode.is_some());
        assert!(debug.total_retrieved > 0);
    }

    #[tokio::test]
    async fn test_graph_stats_counts() {
        let corpus = build_corpus();
        let stats = corpus.engine.graph_stats();
        assert_eq!(stats.chunk_nodes, 5);
        assert_eq!(stats.entity_nodes, 5);
        assert_eq!(stats.total_nodes, 10);
    }
}
