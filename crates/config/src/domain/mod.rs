//! Declarative domain tables
//!
//! Everything here is static data: detection rules, filter markers, intent
//! patterns, synonym bundles, prompt templates and not-found categories.
//! Regexes are compiled once into `Lazy` tables; query-time code only reads.

pub mod intents;
pub mod notfound;
pub mod prompts;
pub mod universities;
pub mod vocabulary;

pub use intents::{intent_params, IntentParams, BENGALI_DATE_PATTERN, INTENT_PATTERNS, SCHEDULE_PHRASES};
pub use notfound::{answer_is_not_found, classify as classify_not_found, NotFoundCategory};
pub use universities::{
    filter_rule, official_website, university_rule, CompiledUniversityRule, FilterRule,
    InstitutionCategory, UniversityRule, COACHING_ABBREV, COACHING_QUERY_PATTERNS,
    COMPILED_UNIVERSITY_RULES, FILTER_RULES, UNIVERSITY_RULES,
};
pub use vocabulary::{
    intent_expansion_terms, Equivalence, SynonymBundle, EQUIVALENCES, FILLER_WORDS,
    SYNONYM_BUNDLES,
};
