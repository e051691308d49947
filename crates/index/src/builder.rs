//! Index artifact builder
//!
//! Drives the whole indexing pass: embed passages, extract triples through
//! the reasoning model, assemble the passage–entity graph, build BM25, and
//! persist everything under `save_dir`. Content-hashed ids make the build
//! reproducible: re-indexing the same documents yields the same graph.

use std::collections::HashSet;
use std::sync::Arc;

use bhorti_core::{ids, Fact, Passage};
use bhorti_graph::{ArtifactPaths, EmbeddingStore, FactIndex, KnowledgeGraph, Vertex};
use bhorti_llm::ModelRegistry;
use bhorti_rag::Bm25Index;

use crate::openie::{ExtractionRecord, TripleExtractor};
use crate::IndexError;

/// Counts reported back to the caller after a build.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IndexSummary {
    pub indexed_docs: usize,
    pub entities: usize,
    pub facts: usize,
}

const EMBED_BATCH: usize = 100;

/// Edge weight for entity–passage mentions and entity–entity co-occurrence.
const EDGE_WEIGHT: f32 = 1.0;

pub struct IndexBuilder {
    registry: Arc<ModelRegistry>,
    paths: ArtifactPaths,
}

impl IndexBuilder {
    pub fn new(registry: Arc<ModelRegistry>, save_dir: &str) -> Self {
        Self {
            registry,
            paths: ArtifactPaths::new(save_dir),
        }
    }

    /// Build and persist all artifacts from raw document chunks.
    pub async fn build(&self, documents: Vec<String>) -> Result<IndexSummary, IndexError> {
        if documents.is_empty() {
            return Err(IndexError::NoDocuments);
        }

        // Dedupe by content hash, preserving first-seen order.
        let mut passages: Vec<Passage> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for text in documents {
            let passage = Passage::new(text);
            if seen.insert(passage.id.clone()) {
                passages.push(passage);
            }
        }
        tracing::info!(passages = passages.len(), "indexing started");

        // Embed passages.
        let passage_texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
        let passage_vectors = self.embed_batched(&passage_texts).await?;
        let dim = self.registry.embedding.dim();

        // OpenIE: one extraction per passage.
        let mut records: Vec<ExtractionRecord> = Vec::new();
        let mut facts: Vec<Fact> = Vec::new();
        let mut fact_ids: HashSet<String> = HashSet::new();
        for passage in &passages {
            let triples =
                TripleExtractor::extract(&self.registry.reasoning, &passage.text).await?;
            for fact in &triples {
                if fact_ids.insert(fact.id()) {
                    facts.push(fact.clone());
                }
            }
            records.push(ExtractionRecord {
                passage_id: passage.id.clone(),
                triples,
            });
        }

        // Graph assembly. Entity vertices dedupe by hash id, so subjects and
        // objects register on first sight in fact order.
        let mut graph = KnowledgeGraph::new();
        for (passage, record) in passages.iter().zip(&records) {
            let passage_node = graph.add_vertex(Vertex {
                name: passage.id.clone(),
                hash_id: passage.id.clone(),
                content: Some(passage.text.clone()),
            })?;

            if record.triples.is_empty() {
                // A passage with no extracted facts still needs a mention
                // edge; its institution tag (or leading words) becomes the
                // anchor entity.
                let anchor = anchor_phrase(&passage.text);
                let anchor_node = graph.add_vertex(Vertex {
                    name: anchor.clone(),
                    hash_id: ids::entity_id(&anchor),
                    content: None,
                })?;
                graph.add_edge(passage_node, anchor_node, EDGE_WEIGHT)?;
                continue;
            }

            for fact in &record.triples {
                let subject = graph.add_vertex(Vertex {
                    name: fact.subject.to_lowercase(),
                    hash_id: ids::entity_id(&fact.subject),
                    content: None,
                })?;
                let object = graph.add_vertex(Vertex {
                    name: fact.object.to_lowercase(),
                    hash_id: ids::entity_id(&fact.object),
                    content: None,
                })?;
                graph.add_edge(passage_node, subject, EDGE_WEIGHT)?;
                graph.add_edge(passage_node, object, EDGE_WEIGHT)?;
                if subject != object {
                    graph.add_edge(subject, object, EDGE_WEIGHT)?;
                }
            }
        }
        graph.validate()?;

        // Embedding stores.
        let passage_store = EmbeddingStore::from_rows(
            passages.iter().map(|p| p.id.clone()).collect(),
            passage_vectors,
            dim,
        )?;

        let entity_phrases: Vec<String> = graph
            .entity_nodes()
            .iter()
            .filter_map(|&idx| graph.vertex(idx).map(|v| v.name.clone()))
            .collect();
        let entity_vectors = self.embed_batched(&entity_phrases).await?;
        let entity_store = EmbeddingStore::from_rows(
            graph
                .entity_nodes()
                .iter()
                .filter_map(|&idx| graph.vertex(idx).map(|v| v.hash_id.clone()))
                .collect(),
            entity_vectors,
            dim,
        )?;

        let fact_texts: Vec<String> = facts
            .iter()
            .map(|f| format!("{} {} {}", f.subject, f.predicate, f.object))
            .collect();
        let fact_vectors = self.embed_batched(&fact_texts).await?;
        let fact_store = EmbeddingStore::from_rows(
            facts.iter().map(|f| f.id()).collect(),
            fact_vectors,
            dim,
        )?;
        let fact_index = FactIndex::new(facts, fact_store)?;

        // BM25 over the passage corpus.
        let bm25 = Bm25Index::build(
            passages
                .iter()
                .map(|p| (p.id.as_str(), p.text.as_str()))
                .collect::<Vec<_>>(),
        );

        // Persist everything.
        std::fs::create_dir_all(self.paths.root()).map_err(|e| IndexError::Io(e.to_string()))?;
        graph.save(&self.paths.graph())?;
        passage_store.save(&self.paths.passage_store())?;
        entity_store.save(&self.paths.entity_store())?;
        fact_index.save(&self.paths.facts(), &self.paths.fact_store())?;
        bm25.save(&self.paths.bm25())
            .map_err(|e| IndexError::Io(e.to_string()))?;

        let openie_json = serde_json::to_string(&records)
            .map_err(|e| IndexError::Io(e.to_string()))?;
        std::fs::write(
            self.paths.openie_results(self.registry.reasoning.model_name()),
            openie_json,
        )
        .map_err(|e| IndexError::Io(e.to_string()))?;

        let summary = IndexSummary {
            indexed_docs: passages.len(),
            entities: graph.entity_nodes().len(),
            facts: fact_index.len(),
        };
        tracing::info!(
            docs = summary.indexed_docs,
            entities = summary.entities,
            facts = summary.facts,
            "indexing finished"
        );
        Ok(summary)
    }

    async fn embed_batched(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IndexError> {
        let mut out = Vec::with_capacity(texts.len());
        for batch in texts.chunks(EMBED_BATCH) {
            let vectors = self.registry.embedding.embed(batch).await?;
            out.extend(vectors);
        }
        Ok(out)
    }
}

/// Anchor entity for a fact-less passage: the bracketed institution tag when
/// present, otherwise the first few words.
fn anchor_phrase(text: &str) -> String {
    if let Some(rest) = text.strip_prefix('[') {
        if let Some(end) = rest.find(']') {
            let tag = rest[..end].trim();
            if !tag.is_empty() {
                return tag.to_lowercase();
            }
        }
    }
    text.split_whitespace()
        .take(3)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bhorti_llm::backend::{
        ChatModel, CompletionMeta, CompletionParams, EmbeddingModel,
    };
    use bhorti_llm::{CachedChat, ChatMessage, GatewayError};
    use std::time::Duration;
    use tempfile::TempDir;

    const DIM: usize = 8;

    struct FakeEmbedder;

    #[async_trait]
    impl EmbeddingModel for FakeEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, GatewayError> {
            Ok(texts
                .iter()
                .map(|t| {
                    let mut v = vec![0.0f32; DIM];
                    for (i, b) in t.bytes().enumerate() {
                        v[i % DIM] += b as f32;
                    }
                    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
                    if norm > 0.0 {
                        v.iter_mut().for_each(|x| *x /= norm);
                    }
                    v
                })
                .collect())
        }

        fn dim(&self) -> usize {
            DIM
        }
    }

    /// Returns triples for KUET passages, nothing for others.
    struct ScriptedOpenIe;

    #[async_trait]
    impl ChatModel for ScriptedOpenIe {
        async fn complete(
            &self,
            messages: &[ChatMessage],
            _params: CompletionParams,
        ) -> Result<(String, CompletionMeta), GatewayError> {
            let user = messages.last().map(|m| m.content.as_str()).unwrap_or("");
            let response = if user.contains("কুয়েট") {
                r#"{"triples": [["কুয়েট", "ভর্তি পরীক্ষার তারিখ", "১০ জানুয়ারি ২০২৬"], ["কুয়েট", "আবেদন ফি", "১২০০ টাকা"]]}"#
            } else {
                r#"{"triples": []}"#
            };
            Ok((response.to_string(), CompletionMeta::default()))
        }

        fn model_name(&self) -> &str {
            "scripted-openie"
        }
    }

    fn registry() -> Arc<ModelRegistry> {
        let make_chat = || {
            CachedChat::new(
                Arc::new(ScriptedOpenIe),
                None,
                None,
                CompletionParams::default(),
                0,
                Duration::from_millis(1),
            )
        };
        Arc::new(ModelRegistry::from_parts(
            make_chat(),
            make_chat(),
            Arc::new(FakeEmbedder),
            None,
        ))
    }

    fn documents() -> Vec<String> {
        vec![
            "[কুয়েট KUET] কুয়েট ভর্তি পরীক্ষার তারিখ ও সময় : ১০ জানুয়ারি ২০২৬। আবেদন ফি ১২০০ টাকা।".to_string(),
            "[ঢাকা বিশ্ববিদ্যালয় DU] ঢাবি ভর্তি বিজ্ঞপ্তি প্রকাশিত হয়েছে।".to_string(),
        ]
    }

    #[tokio::test]
    async fn test_build_persists_all_artifacts() {
        let dir = TempDir::new().unwrap();
        let builder = IndexBuilder::new(registry(), dir.path().to_str().unwrap());

        let summary = builder.build(documents()).await.unwrap();
        assert_eq!(summary.indexed_docs, 2);
        assert_eq!(summary.facts, 2);

        let paths = ArtifactPaths::new(dir.path().to_str().unwrap());
        assert!(paths.index_exists());
        assert!(paths.bm25().exists());
        assert!(paths.entity_store().exists());
        assert!(paths.facts().exists());
        assert!(paths.openie_results("scripted-openie").exists());

        // Loaded graph honors the invariants.
        let graph = KnowledgeGraph::load(&paths.graph()).unwrap();
        graph.validate().unwrap();
        assert_eq!(graph.stats().chunk_nodes, 2);
    }

    #[tokio::test]
    async fn test_factless_passage_gets_anchor_entity() {
        let dir = TempDir::new().unwrap();
        let builder = IndexBuilder::new(registry(), dir.path().to_str().unwrap());
        builder.build(documents()).await.unwrap();

        let paths = ArtifactPaths::new(dir.path().to_str().unwrap());
        let graph = KnowledgeGraph::load(&paths.graph()).unwrap();
        // The DU passage has no triples; its tag became an entity node.
        let anchor = ids::entity_id("ঢাকা বিশ্ববিদ্যালয় du");
        assert!(graph.vertex_index(&anchor).is_some());
    }

    #[tokio::test]
    async fn test_reindex_is_reproducible() {
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();
        let builder_a = IndexBuilder::new(registry(), dir_a.path().to_str().unwrap());
        let builder_b = IndexBuilder::new(registry(), dir_b.path().to_str().unwrap());

        builder_a.build(documents()).await.unwrap();
        builder_b.build(documents()).await.unwrap();

        let graph_a =
            KnowledgeGraph::load(&ArtifactPaths::new(dir_a.path().to_str().unwrap()).graph())
                .unwrap();
        let graph_b =
            KnowledgeGraph::load(&ArtifactPaths::new(dir_b.path().to_str().unwrap()).graph())
                .unwrap();

        assert_eq!(graph_a.vertex_count(), graph_b.vertex_count());
        for idx in 0..graph_a.vertex_count() as u32 {
            let hash_id = &graph_a.vertex(idx).unwrap().hash_id;
            assert!(graph_b.vertex_index(hash_id).is_some());
        }
    }

    #[tokio::test]
    async fn test_empty_documents_rejected() {
        let dir = TempDir::new().unwrap();
        let builder = IndexBuilder::new(registry(), dir.path().to_str().unwrap());
        assert!(matches!(
            builder.build(Vec::new()).await,
            Err(IndexError::NoDocuments)
        ));
    }

    #[tokio::test]
    async fn test_duplicate_documents_deduped() {
        let dir = TempDir::new().unwrap();
        let builder = IndexBuilder::new(registry(), dir.path().to_str().unwrap());
        let mut docs = documents();
        docs.push(docs[0].clone());
        let summary = builder.build(docs).await.unwrap();
        assert_eq!(summary.indexed_docs, 2);
    }
}
