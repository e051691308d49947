//! Knowledge graph, embedding stores and graph-based score propagation
//!
//! Everything in this crate is built at index time and read-only at query
//! time:
//! - [`KnowledgeGraph`]: an arena-indexed, undirected, weighted graph over
//!   passage and entity nodes
//! - [`EmbeddingStore`]: ids aligned with a dense row matrix for vectorized
//!   cosine scoring
//! - [`FactIndex`]: fact triples aligned with their embeddings
//! - [`PprEngine`]: personalized PageRank seeded from matched facts and
//!   dense retrieval scores

pub mod artifacts;
pub mod facts;
pub mod graph;
pub mod ppr;
pub mod store;

pub use artifacts::ArtifactPaths;
pub use facts::FactIndex;
pub use graph::{GraphStats, KnowledgeGraph, Vertex};
pub use ppr::{PprEngine, PprSettings};
pub use store::EmbeddingStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Self-loops are not allowed: {0}")]
    SelfLoop(String),

    #[error("Edge weight {0} outside (0, 1]")]
    BadWeight(f32),

    #[error("Seed vector is all zero; PPR has no teleport target")]
    EmptySeed,

    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<GraphError> for bhorti_core::Error {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::Storage(s) => bhorti_core::Error::Storage(s),
            other => bhorti_core::Error::Graph(other.to_string()),
        }
    }
}
