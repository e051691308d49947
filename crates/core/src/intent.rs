//! Query intent classification target
//!
//! The detector in the pipeline crate assigns exactly one of these to every
//! question; retrieval parameters and answer prompts are selected by intent.

use serde::{Deserialize, Serialize};

/// The kind of information an admission question is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Exam or application dates, schedules, deadlines.
    Date,
    /// Application or admission fees.
    Fee,
    /// Eligibility requirements (GPA, subjects, passing years).
    Eligibility,
    /// Seat counts and quotas.
    Seat,
    /// Admit card download/availability.
    AdmitCard,
    /// Official website or application link.
    Website,
    /// Exam format, syllabus, marks distribution.
    Exam,
    /// Everything else.
    #[default]
    General,
}

impl Intent {
    /// Stable lowercase name, used in logs and debug payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Date => "date",
            Intent::Fee => "fee",
            Intent::Eligibility => "eligibility",
            Intent::Seat => "seat",
            Intent::AdmitCard => "admit_card",
            Intent::Website => "website",
            Intent::Exam => "exam",
            Intent::General => "general",
        }
    }

    /// Intents whose sub-queries get a keyword-augmented BM25 pass in the
    /// multi-entity path.
    pub fn wants_sparse_pass(&self) -> bool {
        matches!(self, Intent::Date | Intent::Fee | Intent::AdmitCard)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
