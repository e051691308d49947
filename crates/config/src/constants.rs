//! Centralized constants
//!
//! Single source of truth for retrieval tuning defaults shared between
//! `settings.rs` defaults and component-level `Default` impls. Domain
//! vocabulary lives in [`crate::domain`], not here.

/// Retrieval and fusion defaults
pub mod retrieval {
    /// Final number of passages returned by the single-entity path.
    pub const RETRIEVAL_TOP_K: usize = 10;

    /// Fact candidates scored against the query before the LLM filter.
    pub const LINKING_TOP_K: usize = 30;

    /// Facts kept after the LLM filter.
    pub const LEN_AFTER_RERANK: usize = 5;

    /// PageRank damping factor for the passage–entity graph walk.
    pub const DAMPING: f64 = 0.5;

    /// Scale applied to normalized DPR scores when seeding passage nodes.
    pub const PASSAGE_NODE_WEIGHT: f64 = 0.5;

    /// Reciprocal rank fusion constant.
    pub const RRF_K: f32 = 60.0;

    /// Minimum score for a passage to be cited as a reference.
    pub const MIN_REFERENCE_SCORE: f32 = 0.4;

    /// Display floor applied to multi-entity reference scores (RRF scores
    /// are intrinsically small).
    pub const MULTI_DISPLAY_FLOOR: f32 = 0.5;

    /// Reference list cap for both paths.
    pub const MAX_REFERENCES: usize = 10;

    /// Reference content truncation, in characters.
    pub const REFERENCE_MAX_CHARS: usize = 1_500;

    /// Per-entity passage cap in the multi-entity path.
    pub const PER_ENTITY_TOP_K: usize = 12;

    /// Passages per entity handed to the slot-aware synthesizer.
    pub const PER_ENTITY_CONTEXT_K: usize = 5;

    /// Coverage warning threshold: fewer docs than this flags the entity.
    pub const COVERAGE_MIN_DOCS: usize = 3;

    /// Jaccard similarity threshold for near-duplicate sub-results.
    pub const DEDUPE_JACCARD: f32 = 0.85;

    /// Characters of passage prefix compared during deduplication.
    pub const DEDUPE_PREFIX_CHARS: usize = 500;

    /// Width cap for parallel per-entity retrieval.
    pub const MAX_PARALLEL_SUBQUERIES: usize = 4;

    /// Strict university filter keeps at least this many docs before
    /// falling back to the unfiltered head.
    pub const STRICT_FILTER_MIN_DOCS: usize = 3;
}

/// Gateway retry/timeout defaults
pub mod gateway {
    /// Retry attempts for transient remote errors.
    pub const MAX_RETRIES: u32 = 3;

    /// Fixed wait between retries (ms).
    pub const RETRY_BACKOFF_MS: u64 = 1_000;

    /// Per-call request timeout (seconds).
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;

    /// Completion cap for reasoning calls (fact filter, NER, decomposition).
    /// Raised for Unicode-heavy Bangla output which tokenizes poorly.
    pub const REASONING_MAX_TOKENS: usize = 1_024;

    /// Completion cap for answer synthesis.
    pub const ANSWER_MAX_TOKENS: usize = 2_048;
}

/// Document chunking contract (consumed from the indexing side)
pub mod chunking {
    /// Hard chunk size cap, characters.
    pub const MAX_CHARS: usize = 3_000;

    /// Preferred chunk size for folder indexing.
    pub const TARGET_CHARS: usize = 2_000;

    /// Overlap between consecutive chunks, characters.
    pub const OVERLAP_CHARS: usize = 200;
}
