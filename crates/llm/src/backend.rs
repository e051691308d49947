//! Gateway traits
//!
//! The retrieval core talks to models only through these three traits, so
//! tests script them and providers swap by configuration.

use async_trait::async_trait;

use crate::message::ChatMessage;
use crate::GatewayError;

/// Sampling controls for one completion call.
///
/// Seed and temperature are part of the cache key, so call sites pass them
/// explicitly instead of mutating backend state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    pub temperature: f32,
    pub seed: i64,
    pub max_tokens: usize,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            seed: 0,
            max_tokens: 1024,
        }
    }
}

/// Token accounting and finish state returned with a completion.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct CompletionMeta {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub finish_reason: String,
    /// True when the response came from the on-disk cache.
    #[serde(default)]
    pub cached: bool,
}

/// Chat-style completion.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> Result<(String, CompletionMeta), GatewayError>;

    /// Model identifier used in cache keys and logs.
    fn model_name(&self) -> &str;
}

/// Batch text embedding. Deterministic and L2-normalized.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, GatewayError>;

    /// Vector dimension produced by this model.
    fn dim(&self) -> usize;
}

/// Black-box precision scorer over `(query, document)` pairs.
///
/// Returns `(candidate_index, score)` pairs sorted best-first, at most
/// `top_k` of them.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_k: usize,
    ) -> Result<Vec<(usize, f32)>, GatewayError>;
}

/// L2-normalize one vector in place; zero vectors stay zero.
pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let mut v = vec![0.0, 0.0];
        l2_normalize(&mut v);
        assert_eq!(v, vec![0.0, 0.0]);
    }
}
