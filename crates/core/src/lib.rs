//! Core types for the admission-circular QA engine
//!
//! This crate provides the foundational data model used across all other
//! crates:
//! - Passages, entities and facts with content-hashed ids
//! - Query-time types (intents, detected entities, retrieval results)
//! - The top-level error type

pub mod ids;
pub mod intent;
pub mod types;

pub use ids::{entity_id, fact_id, passage_id, NodeKind};
pub use intent::Intent;
pub use types::{
    DetectedEntity, Fact, Passage, QueryResult, Reference, RetrievalMode, ScoredPassage,
};

use thiserror::Error;

/// Top-level error type shared across the workspace.
///
/// Crate-local errors convert into this at crate boundaries so the server can
/// map them to HTTP status codes in one place.
#[derive(Error, Debug)]
pub enum Error {
    /// Remote model call failed after retries, or failed permanently.
    #[error("Model gateway error: {0}")]
    Gateway(String),

    /// Retrieval arithmetic or index mismatch. Fatal to the request.
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Knowledge graph is malformed or missing required attributes.
    #[error("Graph error: {0}")]
    Graph(String),

    /// Persisted artifacts could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Indexing pipeline failure.
    #[error("Index error: {0}")]
    Index(String),

    /// The `/ask` path was hit before any index was loaded.
    #[error("Index not loaded: call /index or /index-folder first")]
    IndexNotLoaded,

    /// Invalid request input (empty question, bad folder path).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
