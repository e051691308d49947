//! Gemini REST backends
//!
//! Chat completion via `models/{model}:generateContent` and batch embeddings
//! via `models/{model}:batchEmbedContents`. The API key travels in the
//! `x-goog-api-key` header, resolved from the environment variable named in
//! configuration — the key never appears in settings files.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use bhorti_config::{EmbeddingConfig, ModelEndpoint};

use crate::backend::{l2_normalize, ChatModel, CompletionMeta, CompletionParams, EmbeddingModel};
use crate::message::{ChatMessage, Role};
use crate::{classify_status, GatewayError};

/// Chat backend for the Gemini `generateContent` API.
pub struct GeminiChatBackend {
    client: Client,
    endpoint: ModelEndpoint,
    api_key: String,
}

impl GeminiChatBackend {
    pub fn new(endpoint: ModelEndpoint, timeout: Duration) -> Result<Self, GatewayError> {
        let api_key = endpoint.api_key().ok_or_else(|| {
            GatewayError::Permanent(format!("{} not set", endpoint.api_key_env))
        })?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Permanent(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.endpoint, self.endpoint.model
        )
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none", rename = "systemInstruction")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "usageMetadata")]
    usage: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default, rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct UsageMetadata {
    #[serde(default, rename = "promptTokenCount")]
    prompt_tokens: usize,
    #[serde(default, rename = "candidatesTokenCount")]
    completion_tokens: usize,
}

/// Convert chat messages to the Gemini wire shape: the system message moves
/// to `systemInstruction`, assistant turns become role `model`.
fn to_wire(messages: &[ChatMessage]) -> (Option<Content>, Vec<Content>) {
    let mut system = None;
    let mut contents = Vec::with_capacity(messages.len());
    for message in messages {
        match message.role {
            Role::System => {
                system = Some(Content {
                    role: None,
                    parts: vec![Part {
                        text: message.content.clone(),
                    }],
                });
            }
            Role::User => contents.push(Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: message.content.clone(),
                }],
            }),
            Role::Assistant => contents.push(Content {
                role: Some("model".to_string()),
                parts: vec![Part {
                    text: message.content.clone(),
                }],
            }),
        }
    }
    (system, contents)
}

#[async_trait]
impl ChatModel for GeminiChatBackend {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> Result<(String, CompletionMeta), GatewayError> {
        let (system_instruction, contents) = to_wire(messages);
        let request = GenerateRequest {
            system_instruction,
            contents,
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
                seed: Some(params.seed),
            },
        };

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::ParseFailed(e.to_string()))?;

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::ParseFailed("no candidates in response".to_string()))?;

        let text = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();

        let usage = parsed.usage.unwrap_or_default();
        let meta = CompletionMeta {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            finish_reason: candidate.finish_reason.unwrap_or_else(|| "stop".to_string()),
            cached: false,
        };

        Ok((text, meta))
    }

    fn model_name(&self) -> &str {
        &self.endpoint.model
    }
}

/// Embedding backend for the Gemini `batchEmbedContents` API.
pub struct GeminiEmbeddingBackend {
    client: Client,
    config: EmbeddingConfig,
    api_key: String,
}

impl GeminiEmbeddingBackend {
    pub fn new(config: EmbeddingConfig, timeout: Duration) -> Result<Self, GatewayError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| GatewayError::Permanent(format!("{} not set", config.api_key_env)))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Permanent(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:batchEmbedContents",
            self.config.endpoint, self.config.model
        )
    }
}

#[derive(Serialize)]
struct BatchEmbedRequest {
    requests: Vec<EmbedRequest>,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    content: Content,
    #[serde(rename = "outputDimensionality")]
    output_dimensionality: usize,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

#[async_trait]
impl EmbeddingModel for GeminiEmbeddingBackend {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, GatewayError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // The API rejects empty inputs; remember their slots and embed the
        // rest, restoring zero vectors afterwards.
        let mut non_empty: Vec<(usize, &String)> = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            if !text.trim().is_empty() {
                non_empty.push((i, text));
            }
        }

        let mut out = vec![vec![0.0f32; self.config.dim]; texts.len()];
        if non_empty.is_empty() {
            return Ok(out);
        }

        let request = BatchEmbedRequest {
            requests: non_empty
                .iter()
                .map(|(_, text)| EmbedRequest {
                    model: format!("models/{}", self.config.model),
                    content: Content {
                        role: None,
                        parts: vec![Part {
                            text: (*text).clone(),
                        }],
                    },
                    output_dimensionality: self.config.dim,
                })
                .collect(),
        };

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let parsed: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::ParseFailed(e.to_string()))?;

        if parsed.embeddings.len() != non_empty.len() {
            return Err(GatewayError::ParseFailed(format!(
                "expected {} embeddings, got {}",
                non_empty.len(),
                parsed.embeddings.len()
            )));
        }

        for ((slot, _), embedding) in non_empty.iter().zip(parsed.embeddings) {
            let mut values = embedding.values;
            if values.len() != self.config.dim {
                return Err(GatewayError::ParseFailed(format!(
                    "embedding dim {} != configured {}",
                    values.len(),
                    self.config.dim
                )));
            }
            l2_normalize(&mut values);
            out[*slot] = values;
        }

        Ok(out)
    }

    fn dim(&self) -> usize {
        self.config.dim
    }
}
