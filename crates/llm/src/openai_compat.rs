//! OpenAI-compatible chat backend
//!
//! Serves as the local fallback model (Ollama, llama.cpp server, vLLM — any
//! endpoint speaking `/v1/chat/completions`). Selected purely by
//! configuration; the engine treats it as just another [`ChatModel`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use bhorti_config::ModelEndpoint;

use crate::backend::{ChatModel, CompletionMeta, CompletionParams};
use crate::message::ChatMessage;
use crate::{classify_status, GatewayError};

pub struct OpenAiCompatBackend {
    client: Client,
    endpoint: ModelEndpoint,
}

impl OpenAiCompatBackend {
    pub fn new(endpoint: ModelEndpoint, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Permanent(format!("http client: {}", e)))?;
        Ok(Self { client, endpoint })
    }

    fn url(&self) -> String {
        format!("{}/v1/chat/completions", self.endpoint.endpoint)
    }
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
    stream: bool,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

#[async_trait]
impl ChatModel for OpenAiCompatBackend {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: CompletionParams,
    ) -> Result<(String, CompletionMeta), GatewayError> {
        let request = ChatRequest {
            model: &self.endpoint.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            seed: Some(params.seed),
            stream: false,
        };

        let mut builder = self.client.post(self.url()).json(&request);
        if let Some(key) = self.endpoint.api_key() {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::ParseFailed(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::ParseFailed("no choices in response".to_string()))?;

        let usage = parsed.usage.unwrap_or_default();
        Ok((
            choice.message.content.unwrap_or_default(),
            CompletionMeta {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                finish_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
                cached: false,
            },
        ))
    }

    fn model_name(&self) -> &str {
        &self.endpoint.model
    }
}
