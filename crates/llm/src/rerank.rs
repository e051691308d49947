//! Remote cross-encoder rerank gateway
//!
//! Speaks the Cohere-style `/v2/rerank` shape. Availability is probed once at
//! construction; a missing API key simply yields `None` from the constructor
//! and the rag-side rerank stage passes candidates through.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use bhorti_config::RerankerConfig;

use crate::backend::Reranker;
use crate::{classify_status, GatewayError};

pub struct RemoteReranker {
    client: Client,
    config: RerankerConfig,
    api_key: String,
}

impl RemoteReranker {
    /// Build the gateway if reranking is enabled and the key is present.
    pub fn from_config(config: RerankerConfig, timeout: Duration) -> Option<Self> {
        if !config.enabled {
            tracing::info!("cross-encoder reranking disabled by config");
            return None;
        }
        let api_key = match std::env::var(&config.api_key_env) {
            Ok(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!(
                    "{} not set; cross-encoder reranking will pass through",
                    config.api_key_env
                );
                return None;
            }
        };
        let client = Client::builder().timeout(timeout).build().ok()?;
        Some(Self {
            client,
            config,
            api_key,
        })
    }
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: &'a [String],
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResponse {
    #[serde(default)]
    results: Vec<RerankResult>,
}

#[derive(Deserialize)]
struct RerankResult {
    index: usize,
    relevance_score: f32,
}

#[async_trait]
impl Reranker for RemoteReranker {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_k: usize,
    ) -> Result<Vec<(usize, f32)>, GatewayError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let request = RerankRequest {
            model: &self.config.model,
            query,
            documents,
            top_n: top_k.min(documents.len()),
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let parsed: RerankResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::ParseFailed(e.to_string()))?;

        let mut pairs: Vec<(usize, f32)> = parsed
            .results
            .into_iter()
            .filter(|r| r.index < documents.len())
            .map(|r| (r.index, r.relevance_score))
            .collect();
        pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        pairs.truncate(top_k);
        Ok(pairs)
    }
}
