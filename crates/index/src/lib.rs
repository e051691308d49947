//! Indexing pipeline
//!
//! Turns raw circular documents into the artifacts the retrieval core
//! consumes: chunked passages with institution tags, OpenIE triples from the
//! reasoning model, embedding stores, the passage–entity graph and the BM25
//! index — all persisted under `save_dir`.

pub mod builder;
pub mod chunker;
pub mod openie;

pub use builder::{IndexBuilder, IndexSummary};
pub use chunker::{chunk_text, load_documents_from_folder};
pub use openie::TripleExtractor;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("No documents to index")]
    NoDocuments,

    #[error("Folder not found: {0}")]
    FolderNotFound(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] bhorti_llm::GatewayError),

    #[error("Graph error: {0}")]
    Graph(#[from] bhorti_graph::GraphError),
}

impl From<IndexError> for bhorti_core::Error {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::NoDocuments | IndexError::FolderNotFound(_) => {
                bhorti_core::Error::InvalidInput(err.to_string())
            }
            IndexError::Gateway(e) => e.into(),
            IndexError::Graph(e) => e.into(),
            IndexError::Io(s) => bhorti_core::Error::Storage(s),
        }
    }
}
