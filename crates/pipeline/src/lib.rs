//! Query pipeline
//!
//! The front half understands the question (clarity check and rewrite,
//! entity and intent detection, coaching short-circuit, expansion,
//! decomposition); the back half orchestrates retrieval and synthesizes the
//! grounded answer. [`engine::QueryPipeline`] wires the stages in the
//! canonical order:
//!
//! ```text
//! question → rewrite? → detect → single: expand → retrieve → filter → answer
//!                              ↘ multi: decompose → parallel retrieve → RRF → synthesize
//! ```

pub mod clarity;
pub mod date_extract;
pub mod decompose;
pub mod detect;
pub mod engine;
pub mod expand;
pub mod orchestrator;
pub mod synthesize;

pub use clarity::{is_unclear, ClarityRewriter};
pub use date_extract::extract_exam_date_regex;
pub use decompose::{Decomposer, SubQuery};
pub use detect::{detect_entities, detect_intent, is_coaching_query};
pub use engine::{AskOutcome, QueryPipeline, RetrievalEngine, RetrievalDebug};
pub use expand::expand_query;
pub use orchestrator::{EntityRetrieval, MultiEntityOrchestrator};
