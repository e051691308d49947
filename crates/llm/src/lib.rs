//! Model gateways
//!
//! Uniform, cached interfaces to the three capabilities the retrieval core
//! consumes:
//! - chat completion (`ChatModel`)
//! - batch embeddings (`EmbeddingModel`)
//! - cross-encoder reranking (`Reranker`)
//!
//! Every gateway reports failures through [`GatewayError`], which splits
//! transient from permanent causes so callers retry only what can succeed.
//! Chat completions go through a content-addressed on-disk cache keyed on
//! `(model, seed, temperature, messages)` that survives process restarts.

pub mod backend;
pub mod cache;
pub mod gemini;
pub mod message;
pub mod openai_compat;
pub mod registry;
pub mod rerank;

pub use backend::{ChatModel, CompletionMeta, CompletionParams, EmbeddingModel, Reranker};
pub use cache::ResponseCache;
pub use gemini::{GeminiChatBackend, GeminiEmbeddingBackend};
pub use message::{ChatMessage, Role};
pub use openai_compat::OpenAiCompatBackend;
pub use registry::{CachedChat, ModelRegistry, ModelRole};
pub use rerank::RemoteReranker;

use thiserror::Error;

/// Gateway failure taxonomy.
///
/// `Transient` is retried with fixed backoff up to the configured attempt
/// count; `Permanent` surfaces immediately; `ParseFailed` signals a malformed
/// model response that component-local fallbacks handle.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Rate limit, timeout, connection failure, 5xx. Worth retrying.
    #[error("Transient gateway error: {0}")]
    Transient(String),

    /// Auth failure, unknown model, bad request. Retrying cannot help.
    #[error("Permanent gateway error: {0}")]
    Permanent(String),

    /// The remote answered but the payload did not parse.
    #[error("Unparseable model response: {0}")]
    ParseFailed(String),
}

impl GatewayError {
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Transient(_))
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        // Connection-level failures and timeouts are retryable; everything
        // else at this layer is a client bug.
        if err.is_timeout() || err.is_connect() || err.is_request() {
            GatewayError::Transient(err.to_string())
        } else {
            GatewayError::Permanent(err.to_string())
        }
    }
}

impl From<GatewayError> for bhorti_core::Error {
    fn from(err: GatewayError) -> Self {
        bhorti_core::Error::Gateway(err.to_string())
    }
}

/// Map an HTTP status + body to the right error class.
pub(crate) fn classify_status(status: reqwest::StatusCode, body: String) -> GatewayError {
    if status.as_u16() == 429 || status.is_server_error() {
        GatewayError::Transient(format!("HTTP {}: {}", status, body))
    } else {
        GatewayError::Permanent(format!("HTTP {}: {}", status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let transient = classify_status(reqwest::StatusCode::TOO_MANY_REQUESTS, String::new());
        assert!(transient.is_transient());
        let transient = classify_status(reqwest::StatusCode::BAD_GATEWAY, String::new());
        assert!(transient.is_transient());
        let permanent = classify_status(reqwest::StatusCode::UNAUTHORIZED, String::new());
        assert!(!permanent.is_transient());
    }
}
