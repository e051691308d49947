//! Multi-entity query decomposition
//!
//! The reasoning model splits a comparative question into one sub-question
//! per detected entity (`ABBREV|sub_query` lines). When the parse yield does
//! not match the entity count, a rule-based decomposer extracts the common
//! "question part" and prefixes each entity's full name — degraded but never
//! empty.

use once_cell::sync::Lazy;
use regex::Regex;

use bhorti_config::domain::prompts;
use bhorti_core::DetectedEntity;
use bhorti_llm::{CachedChat, ChatMessage, GatewayError};

/// One per-entity sub-query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubQuery {
    pub abbrev: String,
    pub full_name: String,
    pub query: String,
}

/// Common question tails in Banglish and Bangla, ordered specific-first.
/// Used by the rule-based fallback to isolate what is being asked.
static QUESTION_PART_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(admit\s*card\s*(kobe|kokhon|download)?.*)$",
        r"(?i)((abedon|application)?\s*fee\s*(koto|kt)?.*)$",
        r"(?i)((porikkha|exam)\s*(tarikh|date|kobe).*)$",
        r"(প্রবেশপত্র.*)$",
        r"(আবেদন\s*ফি.*)$",
        r"(ভর্তি\s*পরীক্ষার?\s*তারিখ.*)$",
        r"(পরীক্ষা(র)?\s*(তারিখ|কবে).*)$",
        r"(আসন\s*(সংখ্যা|কত).*)$",
        r"(যোগ্যতা.*)$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("question part pattern"))
    .collect()
});

pub struct Decomposer;

impl Decomposer {
    /// Decompose via the reasoning model, with rule-based fallback.
    pub async fn decompose(
        chat: &CachedChat,
        query: &str,
        entities: &[DetectedEntity],
    ) -> Result<Vec<SubQuery>, GatewayError> {
        let pairs: Vec<(String, String)> = entities
            .iter()
            .map(|e| (e.abbrev.clone(), e.full_name.clone()))
            .collect();
        let messages = ChatMessage::from_pairs(prompts::decompose_messages(query, &pairs));

        match chat.complete(&messages).await {
            Ok((response, _meta)) => {
                let parsed = Self::parse_lines(&response, entities);
                if parsed.len() == entities.len() {
                    return Ok(parsed);
                }
                tracing::warn!(
                    expected = entities.len(),
                    parsed = parsed.len(),
                    "decomposer parse mismatch, using rule-based fallback"
                );
                Ok(Self::rule_based(query, entities))
            }
            Err(e) if !e.is_transient() => {
                tracing::warn!("decomposer LLM failed permanently ({}), using rules", e);
                Ok(Self::rule_based(query, entities))
            }
            Err(e) => Err(e),
        }
    }

    /// Parse `ABBREV|sub_query` lines; unknown abbreviations are dropped and
    /// each entity yields at most one sub-query.
    fn parse_lines(response: &str, entities: &[DetectedEntity]) -> Vec<SubQuery> {
        let mut out: Vec<SubQuery> = Vec::new();
        for line in response.lines() {
            let line = line.trim();
            let Some((abbrev_raw, sub_query)) = line.split_once('|') else {
                continue;
            };
            let abbrev = abbrev_raw.trim().to_lowercase();
            let sub_query = sub_query.trim();
            if sub_query.is_empty() {
                continue;
            }
            let Some(entity) = entities.iter().find(|e| e.abbrev == abbrev) else {
                continue;
            };
            if out.iter().any(|s| s.abbrev == abbrev) {
                continue;
            }
            out.push(SubQuery {
                abbrev,
                full_name: entity.full_name.clone(),
                query: sub_query.to_string(),
            });
        }
        out
    }

    /// Extract the shared question part and prefix each entity's full name.
    pub fn rule_based(query: &str, entities: &[DetectedEntity]) -> Vec<SubQuery> {
        let question_part = QUESTION_PART_PATTERNS
            .iter()
            .find_map(|pattern| {
                pattern
                    .captures(query)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().trim().to_string())
            })
            .unwrap_or_else(|| query.to_string());

        entities
            .iter()
            .map(|entity| SubQuery {
                abbrev: entity.abbrev.clone(),
                full_name: entity.full_name.clone(),
                query: format!("{} {}", entity.full_name, question_part),
            })
            .collect()
    }
}
