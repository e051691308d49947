//! Answer synthesis
//!
//! Two modes over the answer model: the grounded single-entity prompt
//! (Thought/Answer format, counselor voice) and the multi-entity slot-aware
//! prompt that labels one context block per institution and demands
//! "তথ্য পাওয়া যায়নি" for missing slots. Passage text in the multi-entity
//! context is truncated at 1,500 characters — enough to keep schedule tables
//! intact.

use bhorti_config::constants::retrieval::{PER_ENTITY_CONTEXT_K, REFERENCE_MAX_CHARS};
use bhorti_config::domain::prompts;
use bhorti_core::types::truncate_graphemes;
use bhorti_llm::{CachedChat, ChatMessage, GatewayError};
use bhorti_rag::ScoredDoc;

use crate::orchestrator::EntityRetrieval;

pub struct Synthesizer;

impl Synthesizer {
    /// Grounded single-entity answer over the top passages.
    pub async fn answer_single(
        chat: &CachedChat,
        question: &str,
        docs: &[ScoredDoc],
        language_instruction: Option<&str>,
        extracted_date: Option<&str>,
    ) -> Result<String, GatewayError> {
        let context = docs
            .iter()
            .map(|doc| format!("Passage: {}", doc.text))
            .collect::<Vec<_>>()
            .join("\n\n");

        let messages = ChatMessage::from_pairs(prompts::grounded_qa_messages(
            question,
            &context,
            language_instruction,
            extracted_date,
        ));
        let (response, _meta) = chat.complete(&messages).await?;
        Ok(extract_answer(&response))
    }

    /// Slot-aware comparative answer over per-entity result sets.
    ///
    /// `results` comes ordered by entity abbreviation; each entity
    /// contributes its top passages as one labeled block.
    pub async fn answer_multi(
        chat: &CachedChat,
        question: &str,
        results: &[EntityRetrieval],
        is_date_intent: bool,
        language_instruction: Option<&str>,
    ) -> Result<String, GatewayError> {
        let blocks: Vec<(String, String, String, bool)> = results
            .iter()
            .map(|entity| {
                let context = entity
                    .docs
                    .iter()
                    .take(PER_ENTITY_CONTEXT_K)
                    .map(|doc| {
                        format!(
                            "Passage: {}",
                            truncate_graphemes(&doc.text, REFERENCE_MAX_CHARS)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n\n");
                (
                    entity.full_name.clone(),
                    entity.abbrev.clone(),
                    context,
                    entity.low_coverage,
                )
            })
            .collect();

        let messages = ChatMessage::from_pairs(prompts::multi_entity_messages(
            question,
            &blocks,
            is_date_intent,
            language_instruction,
        ));
        let (response, _meta) = chat.complete(&messages).await?;
        Ok(extract_answer(&response))
    }
}

/// Strip the Thought/Answer scaffolding: everything after the first
/// `Answer:` label, or the whole trimmed response when the model skipped the
/// format.
pub fn extract_answer(response: &str) -> String {
    match response.find("Answer:") {
        Some(pos) => response[pos + "Answer:".len()..].trim().to_string(),
        None => response.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bhorti_llm::backend::{ChatModel, CompletionMeta, CompletionParams};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_extract_answer_with_thought() {
        let raw = "Thought: the first passage has the date.\nAnswer: পরীক্ষা ৫ জানুয়ারি।";
        assert_eq!(extract_answer(raw), "পরীক্ষা ৫ জানুয়ারি।");
    }

    #[test]
    fn test_extract_answer_without_label() {
        assert_eq!(extract_answer("  শুধু উত্তর  "), "শুধু উত্তর");
    }

    struct Scripted(String);

    #[async_trait]
    impl ChatModel for Scripted {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _params: CompletionParams,
        ) -> Result<(String, CompletionMeta), GatewayError> {
            Ok((self.0.clone(), CompletionMeta::default()))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn chat(response: &str) -> CachedChat {
        CachedChat::new(
            Arc::new(Scripted(response.to_string())),
            None,
            None,
            CompletionParams::default(),
            0,
            Duration::from_millis(1),
        )
    }

    #[tokio::test]
    async fn test_single_mode_strips_thought() {
        let docs = vec![ScoredDoc::new("p", "[CU] চবি পরীক্ষা ৫ জানুয়ারি", 0.9)];
        let answer = Synthesizer::answer_single(
            &chat("Thought: x\nAnswer: ৫ জানুয়ারি ২০২৬"),
            "চবির পরীক্ষা কবে?",
            &docs,
            None,
            None,
        )
        .await
        .unwrap();
        assert_eq!(answer, "৫ জানুয়ারি ২০২৬");
    }

    #[tokio::test]
    async fn test_multi_mode_builds_blocks() {
        let results = vec![EntityRetrieval {
            abbrev: "kuet".to_string(),
            full_name: "KUET".to_string(),
            sub_query: "q".to_string(),
            docs: vec![],
            low_coverage: true,
        }];
        let answer = Synthesizer::answer_multi(
            &chat("| টেবিল |"),
            "fee?",
            &results,
            false,
            None,
        )
        .await
        .unwrap();
        assert_eq!(answer, "| টেবিল |");
    }
}
