//! OpenIE triple extraction
//!
//! One reasoning-model call per passage, asking for
//! `{"triples": [[subject, predicate, object], ...]}`. Parsing is tolerant
//! (fences stripped, truncated arrays repaired); a passage whose extraction
//! fails to parse simply contributes no facts — indexing never aborts on a
//! single bad response.

use serde::{Deserialize, Serialize};

use bhorti_config::domain::prompts;
use bhorti_core::Fact;
use bhorti_llm::{CachedChat, ChatMessage};

use crate::IndexError;

/// Extraction record persisted to `openie_results_ner_<model>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub passage_id: String,
    pub triples: Vec<Fact>,
}

#[derive(Deserialize)]
struct TriplePayload {
    #[serde(default)]
    triples: Vec<Vec<String>>,
}

pub struct TripleExtractor;

impl TripleExtractor {
    /// Extract facts from one passage.
    pub async fn extract(chat: &CachedChat, passage: &str) -> Result<Vec<Fact>, IndexError> {
        let messages = ChatMessage::from_pairs(prompts::triple_extraction_messages(passage));
        let (response, _meta) = chat.complete(&messages).await?;
        Ok(Self::parse(&response))
    }

    /// Tolerant parse of the extraction payload.
    pub fn parse(response: &str) -> Vec<Fact> {
        let cleaned = response.replace("```json", "").replace("```", "");
        let body = match cleaned.find('{') {
            Some(start) => {
                let tail = &cleaned[start..];
                match tail.rfind('}') {
                    Some(end) => tail[..=end].to_string(),
                    None => tail.to_string(),
                }
            }
            None => return Vec::new(),
        };

        for candidate in [body.clone(), balance(&body)] {
            if let Ok(payload) = serde_json::from_str::<TriplePayload>(&candidate) {
                let mut facts: Vec<Fact> = Vec::new();
                for triple in payload.triples {
                    if triple.len() != 3 {
                        continue;
                    }
                    let fact = Fact::new(
                        triple[0].trim(),
                        triple[1].trim(),
                        triple[2].trim(),
                    );
                    if fact.subject.is_empty() || fact.object.is_empty() {
                        continue;
                    }
                    if !facts.contains(&fact) {
                        facts.push(fact);
                    }
                }
                return facts;
            }
        }
        Vec::new()
    }
}

fn balance(body: &str) -> String {
    let mut out = body.trim_end().trim_end_matches(',').to_string();
    let missing_sq = out.matches('[').count().saturating_sub(out.matches(']').count());
    for _ in 0..missing_sq {
        out.push(']');
    }
    let missing_br = out.matches('{').count().saturating_sub(out.matches('}').count());
    for _ in 0..missing_br {
        out.push('}');
    }
    out
}
