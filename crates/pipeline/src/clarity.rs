//! Clarity check and query rewriting
//!
//! A query is unclear when it has fewer than three tokens, matches one of a
//! fixed set of vague patterns (filler-only or pronoun-only clauses), or
//! keeps fewer than two substantive tokens after filler removal. Unclear
//! queries get one rewrite attempt from the reasoning model; the sentinel
//! `UNCLEAR` keeps the original. The response envelope always echoes the
//! original question regardless of what downstream stages used.

use once_cell::sync::Lazy;
use regex::Regex;

use bhorti_config::domain::prompts::{self, UNCLEAR_SENTINEL};
use bhorti_config::domain::FILLER_WORDS;
use bhorti_llm::{CachedChat, ChatMessage, GatewayError};

/// Filler-only and pronoun-only clauses that carry no retrievable content.
static VAGUE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)^\s*(eta|eita|oita|ki|kno|keno|hmm+|acha|accha)\s*\??\s*$",
        r"(?i)^\s*(eta|eita|oita)\s+(ki|kno|keno)\s*\??\s*$",
        r"^\s*(এটা|ওটা|কি|কী|কেন)\s*\??\s*$",
        r"^\s*(এটা|ওটা)\s+(কি|কী|কেন)\s*\??\s*$",
        r"(?i)^\s*(what|why|how)\s*\??\s*$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("vague pattern"))
    .collect()
});

/// Should this query go through the rewriter?
pub fn is_unclear(query: &str) -> bool {
    let trimmed = query.trim();
    let tokens: Vec<&str> = trimmed.split_whitespace().collect();

    if tokens.len() < 3 {
        return true;
    }
    if VAGUE_PATTERNS.iter().any(|p| p.is_match(trimmed)) {
        return true;
    }

    let substantive = tokens
        .iter()
        .filter(|t| {
            let lower = t.to_lowercase();
            t.chars().count() > 2 && !FILLER_WORDS.contains(&lower.as_str())
        })
        .count();
    substantive < 2
}

/// LLM-backed rewriter for unclear queries.
pub struct ClarityRewriter;

impl ClarityRewriter {
    /// Rewrite an unclear query. Returns the original when the model
    /// answers `UNCLEAR`, produces an empty line, or fails permanently —
    /// a bad rewrite must never block retrieval on the user's own words.
    pub async fn rewrite(chat: &CachedChat, query: &str) -> Result<String, GatewayError> {
        let messages = ChatMessage::from_pairs(prompts::rewrite_messages(query));
        let (response, _meta) = chat.complete(&messages).await?;
        let rewritten = response.trim();

        if rewritten.is_empty() || rewritten == UNCLEAR_SENTINEL {
            tracing::debug!(query, "rewriter returned UNCLEAR, keeping original");
            return Ok(query.to_string());
        }
        // Single-line answers only; a chatty model forfeits the rewrite.
        let first_line = rewritten.lines().next().unwrap_or(rewritten).trim();
        if first_line.is_empty() {
            return Ok(query.to_string());
        }
        tracing::debug!(original = query, rewritten = first_line, "query rewritten");
        Ok(first_line.to_string())
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
    fn test_short_queries_unclear() {
        assert!(is_unclear("eta ki?"));
        assert!(is_unclear("ভর্তি"));
        assert!(is_unclear(""));
    }

    #[test]
    fn test_vague_patterns_unclear() {
        assert!(is_unclear("এটা কি?"));
        assert!(is_unclear("hmm"));
    }

    #[test]
    fn test_filler_heavy_unclear() {
        // Three tokens, but only one substantive after filler removal.
        assert!(is_unclear("acha bhai bhorti"));
    }

    #[test]
    fn test_clear_queries_pass() {
        assert!(!is_unclear("চবির পরীক্ষার তারিখ কবে?"));
        assert!(!is_unclear("BUET admission fee koto taka"));
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
    async fn test_rewrite_applies_model_output() {
        let rewritten =
            ClarityRewriter::rewrite(&chat("ভর্তি পরীক্ষার তারিখ কবে?"), "eta ki?")
                .await
                .unwrap();
        assert_eq!(rewritten, "ভর্তি পরীক্ষার তারিখ কবে?");
    }

    #[tokio::test]
    async fn test_unclear_sentinel_keeps_original() {
        let rewritten = ClarityRewriter::rewrite(&chat("UNCLEAR"), "eta ki?")
            .await
            .unwrap();
        assert_eq!(rewritten, "eta ki?");
    }

    #[tokio::test]
    async fn test_empty_response_keeps_original() {
        let rewritten = ClarityRewriter::rewrite(&chat("   "), "eta ki?")
            .await
            .unwrap();
        assert_eq!(rewritten, "eta ki?");
    }
}
