//! Configuration for the admission-circular QA engine
//!
//! Two halves:
//! - [`Settings`]: operational configuration (server, model endpoints,
//!   retrieval tuning, paths), built once at startup from layered TOML files
//!   and `BHORTI_*` environment variables. Immutable afterwards.
//! - [`domain`]: declarative domain tables — university detection rules,
//!   filter markers, intent patterns, synonym bundles, prompt templates and
//!   not-found categories. All regexes are precompiled into static tables at
//!   first use; nothing is compiled inside a query.

pub mod constants;
pub mod domain;
pub mod settings;

pub use settings::{
    EmbeddingConfig, ModelEndpoint, ModelsConfig, PathsConfig, RerankerConfig, RetrievalConfig,
    ServerConfig, Settings,
};

use thiserror::Error;

/// Errors when building settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

impl From<ConfigError> for bhorti_core::Error {
    fn from(err: ConfigError) -> Self {
        bhorti_core::Error::Config(err.to_string())
    }
}
