//! HTTP surface for the admission-circular QA engine
//!
//! A thin axum wrapper over the retrieval core: status, indexing, question
//! answering, retrieval diagnostics, graph statistics and reload.

pub mod http;
pub mod state;

pub use http::create_router;
pub use state::AppState;
