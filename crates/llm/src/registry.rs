//! Model registry
//!
//! Holds the three chat roles (reasoning, answer, fallback), the embedding
//! backend and the optional reranker, each behind its gateway trait. Call
//! sites pick a role; providers are chosen purely by configuration.
//!
//! [`CachedChat`] layers the response cache and the retry policy over a raw
//! [`ChatModel`]: cache reads are attempted on every try, writes are skipped
//! on failure, and only transient errors are retried.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bhorti_config::{ModelEndpoint, ModelsConfig};

use crate::backend::{ChatModel, CompletionMeta, CompletionParams, EmbeddingModel, Reranker};
use crate::cache::{cache_key, ResponseCache};
use crate::gemini::{GeminiChatBackend, GeminiEmbeddingBackend};
use crate::message::ChatMessage;
use crate::openai_compat::OpenAiCompatBackend;
use crate::rerank::RemoteReranker;
use crate::GatewayError;

/// Which chat endpoint a call site wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    /// Fast/cheap model: NER, decomposition, fact filtering, rewriting.
    Reasoning,
    /// Synthesis model for user-facing answers.
    Answer,
}

/// A chat model with caching, bounded retry and optional fallback.
pub struct CachedChat {
    primary: Arc<dyn ChatModel>,
    fallback: Option<Arc<dyn ChatModel>>,
    cache: Option<ResponseCache>,
    defaults: CompletionParams,
    max_retries: u32,
    backoff: Duration,
}

impl CachedChat {
    pub fn new(
        primary: Arc<dyn ChatModel>,
        fallback: Option<Arc<dyn ChatModel>>,
        cache: Option<ResponseCache>,
        defaults: CompletionParams,
        max_retries: u32,
        backoff: Duration,
    ) -> Self {
        Self {
            primary,
            fallback,
            cache,
            defaults,
            max_retries,
            backoff,
        }
    }

    /// Default sampling parameters for this role (from configuration).
    pub fn defaults(&self) -> CompletionParams {
        self.defaults
    }

    pub fn model_name(&self) -> &str {
        self.primary.model_name()
    }

    /// Complete with the role's default parameters.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
    ) -> Result<(String, CompletionMeta), GatewayError> {
        self.complete_with(messages, self.defaults).await
    }

    /// Complete with explicit parameters.
    ///
    /// Cache hit short-circuits everything. Transient failures retry with
    /// fixed backoff; after the attempts are spent (or on a permanent error)
    /// the fallback model gets one shot before the error surfaces.
    pub async fn complete_with(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> Result<(String, CompletionMeta), GatewayError> {
        let key = cache_key(
            self.primary.model_name(),
            params.seed,
            params.temperature,
            messages,
        );
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key) {
                tracing::debug!(model = self.primary.model_name(), "llm cache hit");
                return Ok(hit);
            }
        }

        let mut last_error: Option<GatewayError> = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    model = self.primary.model_name(),
                    attempt,
                    max = self.max_retries,
                    "transient gateway error, retrying"
                );
                tokio::time::sleep(self.backoff).await;
            }
            match self.primary.complete(messages, params).await {
                Ok((text, meta)) => {
                    if let Some(cache) = &self.cache {
                        cache.put(&key, &text, &meta);
                    }
                    return Ok((text, meta));
                }
                Err(e) if e.is_transient() => last_error = Some(e),
                Err(e) => {
                    last_error = Some(e);
                    break;
                }
            }
        }

        if let Some(fallback) = &self.fallback {
            tracing::warn!(
                primary = self.primary.model_name(),
                fallback = fallback.model_name(),
                "primary model failed, trying fallback"
            );
            match fallback.complete(messages, params).await {
                Ok((text, meta)) => {
                    if let Some(cache) = &self.cache {
                        cache.put(&key, &text, &meta);
                    }
                    return Ok((text, meta));
                }
                Err(e) => {
                    tracing::error!("fallback model failed too: {}", e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| GatewayError::Transient("retries exhausted".to_string())))
    }
}

/// All model gateways, constructed once at startup and shared read-only.
pub struct ModelRegistry {
    pub reasoning: CachedChat,
    pub answer: CachedChat,
    pub embedding: Arc<dyn EmbeddingModel>,
    pub reranker: Option<Arc<dyn Reranker>>,
}

impl ModelRegistry {
    /// Build live gateways from configuration. `save_dir` hosts the
    /// `llm_cache/` directory.
    pub fn from_config(models: &ModelsConfig, save_dir: &Path) -> Result<Self, GatewayError> {
        let timeout = Duration::from_secs(models.request_timeout_secs);
        let backoff = Duration::from_millis(models.retry_backoff_ms);
        let cache_dir = save_dir.join("llm_cache");

        let fallback: Option<Arc<dyn ChatModel>> = match &models.fallback {
            Some(endpoint) => Some(Arc::new(OpenAiCompatBackend::new(
                endpoint.clone(),
                timeout,
            )?)),
            None => None,
        };

        let reasoning = Self::build_chat(
            &models.reasoning,
            fallback.clone(),
            &cache_dir,
            timeout,
            models.max_retries,
            backoff,
        )?;
        let answer = Self::build_chat(
            &models.answer,
            fallback,
            &cache_dir,
            timeout,
            models.max_retries,
            backoff,
        )?;

        let embedding: Arc<dyn EmbeddingModel> = Arc::new(GeminiEmbeddingBackend::new(
            models.embedding.clone(),
            timeout,
        )?);

        let reranker = RemoteReranker::from_config(models.reranker.clone(), timeout)
            .map(|r| Arc::new(r) as Arc<dyn Reranker>);

        Ok(Self {
            reasoning,
            answer,
            embedding,
            reranker,
        })
    }

    fn build_chat(
        endpoint: &ModelEndpoint,
        fallback: Option<Arc<dyn ChatModel>>,
        cache_dir: &Path,
        timeout: Duration,
        max_retries: u32,
        backoff: Duration,
    ) -> Result<CachedChat, GatewayError> {
        let backend = Arc::new(GeminiChatBackend::new(endpoint.clone(), timeout)?);
        let cache = ResponseCache::open(cache_dir, &endpoint.model)?;
        Ok(CachedChat::new(
            backend,
            fallback,
            Some(cache),
            CompletionParams {
                temperature: endpoint.temperature,
                seed: endpoint.seed,
                max_tokens: endpoint.max_tokens,
            },
            max_retries,
            backoff,
        ))
    }

    /// Assemble a registry from pre-built parts. Tests use this with
    /// scripted gateways; no network is involved.
    pub fn from_parts(
        reasoning: CachedChat,
        answer: CachedChat,
        embedding: Arc<dyn EmbeddingModel>,
        reranker: Option<Arc<dyn Reranker>>,
    ) -> Self {
        Self {
            reasoning,
            answer,
            embedding,
            reranker,
        }
    }

    pub fn chat(&self, role: ModelRole) -> &CachedChat {
        match role {
            ModelRole::Reasoning => &self.reasoning,
            ModelRole::Answer => &self.answer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Scripted chat model: fails `failures` times, then answers.
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
        permanent: bool,
    }

    #[async_trait]
    impl ChatModel for Flaky {
        async fn complete(
            &self,
            _messages: &[ChatMessage],
            _params: CompletionParams,
        ) -> Result<(String, CompletionMeta), GatewayError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                if self.permanent {
                    Err(GatewayError::Permanent("auth".to_string()))
                } else {
                    Err(GatewayError::Transient("rate limit".to_string()))
                }
            } else {
                Ok(("ok".to_string(), CompletionMeta::default()))
            }
        }

        fn model_name(&self) -> &str {
            "flaky"
        }
    }

    fn chat_with(flaky: Flaky, cache_dir: &TempDir, retries: u32) -> CachedChat {
        CachedChat::new(
            Arc::new(flaky),
            None,
            Some(ResponseCache::open(cache_dir.path(), "flaky").unwrap()),
            CompletionParams::default(),
            retries,
            Duration::from_millis(1),
        )
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let dir = TempDir::new().unwrap();
        let chat = chat_with(
            Flaky {
                failures: 2,
                calls: AtomicUsize::new(0),
                permanent: false,
            },
            &dir,
            3,
        );
        let messages = vec![ChatMessage::user("q")];
        let (text, _) = chat.complete(&messages).await.unwrap();
        assert_eq!(text, "ok");
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let dir = TempDir::new().unwrap();
        let flaky = Flaky {
            failures: 100,
            calls: AtomicUsize::new(0),
            permanent: true,
        };
        let chat = chat_with(flaky, &dir, 3);
        let messages = vec![ChatMessage::user("q")];
        let err = chat.complete(&messages).await.unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_cache_hit_skips_backend() {
        let dir = TempDir::new().unwrap();
        let chat = chat_with(
            Flaky {
                failures: 0,
                calls: AtomicUsize::new(0),
                permanent: false,
            },
            &dir,
            0,
        );
        let messages = vec![ChatMessage::user("একই প্রশ্ন")];
        let (first, meta1) = chat.complete(&messages).await.unwrap();
        assert!(!meta1.cached);
        let (second, meta2) = chat.complete(&messages).await.unwrap();
        assert!(meta2.cached);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_fallback_after_exhausted_retries() {
        let dir = TempDir::new().unwrap();
        let fallback: Arc<dyn ChatModel> = Arc::new(Flaky {
            failures: 0,
            calls: AtomicUsize::new(0),
            permanent: false,
        });
        let chat = CachedChat::new(
            Arc::new(Flaky {
                failures: 100,
                calls: AtomicUsize::new(0),
                permanent: false,
            }),
            Some(fallback),
            Some(ResponseCache::open(dir.path(), "flaky").unwrap()),
            CompletionParams::default(),
            1,
            Duration::from_millis(1),
        );
        let messages = vec![ChatMessage::user("q")];
        let (text, _) = chat.complete(&messages).await.unwrap();
        assert_eq!(text, "ok");
    }
}
