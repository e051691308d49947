//! Main settings module
//!
//! Settings are assembled once at startup from (in order of precedence):
//! environment variables prefixed `BHORTI_` (`__` as section separator),
//! an optional `config/local.toml`, and `config/default.toml`. The resulting
//! struct is immutable; components receive the slices they need by value at
//! construction time.

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{gateway, retrieval};
use crate::ConfigError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Permissive CORS for local clients; disable behind a real gateway.
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: true,
        }
    }
}

/// Filesystem layout for persisted artifacts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root for all persisted state. `SAVE_DIR` env var overrides.
    #[serde(default = "default_save_dir")]
    pub save_dir: String,
    /// Default folder scanned by `/index-folder` when none is given.
    #[serde(default = "default_documents_dir")]
    pub documents_dir: String,
}

fn default_save_dir() -> String {
    std::env::var("SAVE_DIR").unwrap_or_else(|_| "outputs".to_string())
}

fn default_documents_dir() -> String {
    "documents".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            save_dir: default_save_dir(),
            documents_dir: default_documents_dir(),
        }
    }
}

/// One remote (or local) chat model endpoint.
///
/// Provider selection is configuration-only: the engine picks an endpoint by
/// role and never hard-codes a vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelEndpoint {
    /// Model identifier sent on the wire.
    pub model: String,
    /// Base URL of the provider API.
    pub endpoint: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default)]
    pub seed: i64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_max_tokens() -> usize {
    gateway::REASONING_MAX_TOKENS
}

impl ModelEndpoint {
    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

/// Embedding model endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Expected vector dimension; loads fail fast on mismatch.
    #[serde(default = "default_embedding_dim")]
    pub dim: usize,
}

fn default_embedding_model() -> String {
    "gemini-embedding-001".to_string()
}

fn default_gemini_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_embedding_dim() -> usize {
    1024
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            endpoint: default_gemini_endpoint(),
            api_key_env: default_api_key_env(),
            dim: default_embedding_dim(),
        }
    }
}

/// Cross-encoder rerank endpoint. When disabled or unreachable the rerank
/// stage passes candidates through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RerankerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rerank_model")]
    pub model: String,
    #[serde(default = "default_rerank_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_rerank_key_env")]
    pub api_key_env: String,
}

fn default_rerank_model() -> String {
    "rerank-multilingual-v3.0".to_string()
}

fn default_rerank_endpoint() -> String {
    "https://api.cohere.com/v2/rerank".to_string()
}

fn default_rerank_key_env() -> String {
    "COHERE_API_KEY".to_string()
}

impl Default for RerankerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: default_rerank_model(),
            endpoint: default_rerank_endpoint(),
            api_key_env: default_rerank_key_env(),
        }
    }
}

/// The three chat roles plus embedding and rerank endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Fast/cheap model for NER, decomposition and the fact filter.
    #[serde(default = "default_reasoning_endpoint")]
    pub reasoning: ModelEndpoint,
    /// Model used for answer synthesis.
    #[serde(default = "default_answer_endpoint")]
    pub answer: ModelEndpoint,
    /// Local OpenAI-compatible fallback, used when the primary is down.
    #[serde(default)]
    pub fallback: Option<ModelEndpoint>,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub reranker: RerankerConfig,
    /// Retry attempts for transient gateway failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed wait between retries, milliseconds.
    #[serde(default = "default_backoff_ms")]
    pub retry_backoff_ms: u64,
    /// Per-call timeout, seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_reasoning_endpoint() -> ModelEndpoint {
    ModelEndpoint {
        model: "gemini-2.5-flash".to_string(),
        endpoint: default_gemini_endpoint(),
        api_key_env: default_api_key_env(),
        temperature: 0.0,
        seed: 0,
        max_tokens: gateway::REASONING_MAX_TOKENS,
    }
}

fn default_answer_endpoint() -> ModelEndpoint {
    ModelEndpoint {
        model: "gemini-2.5-flash".to_string(),
        endpoint: default_gemini_endpoint(),
        api_key_env: default_api_key_env(),
        temperature: 0.0,
        seed: 0,
        max_tokens: gateway::ANSWER_MAX_TOKENS,
    }
}

fn default_max_retries() -> u32 {
    gateway::MAX_RETRIES
}

fn default_backoff_ms() -> u64 {
    gateway::RETRY_BACKOFF_MS
}

fn default_timeout_secs() -> u64 {
    gateway::REQUEST_TIMEOUT_SECS
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            reasoning: default_reasoning_endpoint(),
            answer: default_answer_endpoint(),
            fallback: None,
            embedding: EmbeddingConfig::default(),
            reranker: RerankerConfig::default(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_backoff_ms(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

/// Retrieval and fusion tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "d_retrieval_top_k")]
    pub retrieval_top_k: usize,
    #[serde(default = "d_linking_top_k")]
    pub linking_top_k: usize,
    #[serde(default = "d_len_after_rerank")]
    pub len_after_rerank: usize,
    #[serde(default = "d_damping")]
    pub damping: f64,
    #[serde(default = "d_passage_node_weight")]
    pub passage_node_weight: f64,
    #[serde(default = "d_rrf_k")]
    pub rrf_k: f32,
    #[serde(default = "d_min_reference_score")]
    pub min_reference_score: f32,
    #[serde(default = "d_multi_display_floor")]
    pub multi_display_floor: f32,
    #[serde(default = "d_max_references")]
    pub max_references: usize,
}

fn d_retrieval_top_k() -> usize {
    retrieval::RETRIEVAL_TOP_K
}
fn d_linking_top_k() -> usize {
    retrieval::LINKING_TOP_K
}
fn d_len_after_rerank() -> usize {
    retrieval::LEN_AFTER_RERANK
}
fn d_damping() -> f64 {
    retrieval::DAMPING
}
fn d_passage_node_weight() -> f64 {
    retrieval::PASSAGE_NODE_WEIGHT
}
fn d_rrf_k() -> f32 {
    retrieval::RRF_K
}
fn d_min_reference_score() -> f32 {
    retrieval::MIN_REFERENCE_SCORE
}
fn d_multi_display_floor() -> f32 {
    retrieval::MULTI_DISPLAY_FLOOR
}
fn d_max_references() -> usize {
    retrieval::MAX_REFERENCES
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            retrieval_top_k: d_retrieval_top_k(),
            linking_top_k: d_linking_top_k(),
            len_after_rerank: d_len_after_rerank(),
            damping: d_damping(),
            passage_node_weight: d_passage_node_weight(),
            rrf_k: d_rrf_k(),
            min_reference_score: d_min_reference_score(),
            multi_display_floor: d_multi_display_floor(),
            max_references: d_max_references(),
        }
    }
}

impl Settings {
    /// Load settings from config files and environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load with an explicit config directory (used by tests).
    pub fn load_from(config_dir: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(&format!("{}/default", config_dir)).required(false))
            .add_source(File::with_name(&format!("{}/local", config_dir)).required(false))
            .add_source(Environment::with_prefix("BHORTI").separator("__"));

        let config = builder
            .build()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        let mut settings: Settings = config
            .try_deserialize()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        // SAVE_DIR env var wins over any file value.
        if let Ok(dir) = std::env::var("SAVE_DIR") {
            if !dir.is_empty() {
                settings.paths.save_dir = dir;
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.retrieval.damping) {
            return Err(ConfigError::Invalid(format!(
                "damping must be in [0, 1], got {}",
                self.retrieval.damping
            )));
        }
        if self.retrieval.retrieval_top_k == 0 {
            return Err(ConfigError::Invalid(
                "retrieval_top_k must be positive".to_string(),
            ));
        }
        if self.retrieval.len_after_rerank > self.retrieval.linking_top_k {
            return Err(ConfigError::Invalid(
                "len_after_rerank cannot exceed linking_top_k".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.retrieval.retrieval_top_k, 10);
        assert!((settings.retrieval.damping - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_load_missing_files_falls_back_to_defaults() {
        let settings = Settings::load_from("does/not/exist").unwrap();
        assert_eq!(settings.server.port, 8000);
    }

    #[test]
    fn test_validation_rejects_bad_damping() {
        let mut settings = Settings::default();
        settings.retrieval.damping = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_reasoning_endpoint_is_deterministic() {
        let settings = Settings::default();
        assert_eq!(settings.models.reasoning.temperature, 0.0);
        assert_eq!(settings.models.reasoning.seed, 0);
    }
}
