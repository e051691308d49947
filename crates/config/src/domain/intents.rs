//! Intent patterns and per-intent retrieval parameters
//!
//! The classifier walks [`INTENT_PATTERNS`] in order and returns on the first
//! match, so the table order encodes priority: dates before fees before
//! eligibility, with `general` as the fall-through. Patterns mix Bengali
//! vocabulary, Banglish spellings and English keywords because users freely
//! switch scripts mid-question.

use once_cell::sync::Lazy;
use regex::Regex;

use bhorti_core::Intent;

/// Per-intent retrieval tuning.
#[derive(Debug, Clone)]
pub struct IntentParams {
    pub intent: Intent,
    /// Candidate cap for this intent's sub-retrieval.
    pub top_k: usize,
    /// Sparse weight in the per-entity fusion.
    pub bm25_weight: f32,
    /// Keywords appended to the BM25 query for this intent.
    pub boost_keywords: &'static [&'static str],
}

/// Priority-ordered intent patterns. First match wins.
pub static INTENT_PATTERNS: Lazy<Vec<(Intent, Regex)>> = Lazy::new(|| {
    let table: &[(Intent, &str)] = &[
        // Admit card before date: "প্রবেশপত্র কবে" is an admit-card question.
        (
            Intent::AdmitCard,
            r"(?i)প্রবেশপত্র|এডমিট|অ্যাডমিট|\badmit\s*card\b|\badmit\b",
        ),
        (
            Intent::Date,
            r"(?i)তারিখ|কবে|কখন|সময়সূচী|সময়সূচি|শুরু হবে|শেষ হবে|ডেডলাইন|তারিখসমূহ|\b(date|deadline|schedule|kobe|kokhon|tarikh|last date|when)\b|জানুয়ারি|ফেব্রুয়ারি|মার্চ|এপ্রিল|মে|জুন|জুলাই|আগস্ট|সেপ্টেম্বর|অক্টোবর|নভেম্বর|ডিসেম্বর|\b(january|february|march|april|may|june|july|august|september|october|november|december)\b",
        ),
        (
            Intent::Fee,
            r"(?i)ফি|টাকা|খরচ|আবেদন ফি|ভর্তি ফি|\b(fee|fees|koto taka|taka|cost|charge)\b",
        ),
        (
            Intent::Eligibility,
            r"(?i)যোগ্যতা|জিপিএ|ন্যূনতম|আবেদনের যোগ্যতা|পাশ|উত্তীর্ণ|\b(eligibility|eligible|gpa|requirement|qualification|jogyota)\b",
        ),
        (
            Intent::Seat,
            r"(?i)আসন|সিট|কোটা|আসন সংখ্যা|\b(seat|seats|quota|ason)\b",
        ),
        (
            Intent::Website,
            r"(?i)ওয়েবসাইট|লিংক|লিঙ্ক|আবেদন করব কিভাবে|\b(website|link|url|apply online|how to apply)\b",
        ),
        (
            Intent::Exam,
            r"(?i)পরীক্ষা|মানবণ্টন|সিলেবাস|নম্বর বণ্টন|প্রশ্ন|\b(exam|syllabus|marks distribution|question pattern|porikkha)\b",
        ),
    ];

    table
        .iter()
        .map(|(intent, pattern)| {
            (
                *intent,
                Regex::new(pattern).expect("invalid intent pattern"),
            )
        })
        .collect()
});

/// Per-intent parameters, consulted by the multi-entity orchestrator.
pub static INTENT_PARAMS: &[IntentParams] = &[
    IntentParams {
        intent: Intent::Date,
        top_k: 15,
        bm25_weight: 0.45,
        boost_keywords: &[
            "ভর্তি পরীক্ষার তারিখ",
            "আবেদনের শেষ তারিখ",
            "সময়সূচী",
            "admission test date",
            "application deadline",
        ],
    },
    IntentParams {
        intent: Intent::Fee,
        top_k: 12,
        bm25_weight: 0.4,
        boost_keywords: &["আবেদন ফি", "ভর্তি ফি", "টাকা", "application fee"],
    },
    IntentParams {
        intent: Intent::AdmitCard,
        top_k: 12,
        bm25_weight: 0.4,
        boost_keywords: &["প্রবেশপত্র", "ডাউনলোড", "admit card download"],
    },
    IntentParams {
        intent: Intent::Eligibility,
        top_k: 12,
        bm25_weight: 0.3,
        boost_keywords: &["আবেদনের যোগ্যতা", "জিপিএ", "minimum gpa"],
    },
    IntentParams {
        intent: Intent::Seat,
        top_k: 10,
        bm25_weight: 0.3,
        boost_keywords: &["আসন সংখ্যা", "total seats"],
    },
    IntentParams {
        intent: Intent::Website,
        top_k: 8,
        bm25_weight: 0.3,
        boost_keywords: &["ওয়েবসাইট", "অনলাইনে আবেদন", "official website"],
    },
    IntentParams {
        intent: Intent::Exam,
        top_k: 12,
        bm25_weight: 0.35,
        boost_keywords: &["মানবণ্টন", "সিলেবাস", "marks distribution"],
    },
    IntentParams {
        intent: Intent::General,
        top_k: 10,
        bm25_weight: 0.3,
        boost_keywords: &[],
    },
];

/// Parameters for an intent; `General` always exists.
pub fn intent_params(intent: Intent) -> &'static IntentParams {
    INTENT_PARAMS
        .iter()
        .find(|p| p.intent == intent)
        .unwrap_or_else(|| {
            INTENT_PARAMS
                .iter()
                .find(|p| p.intent == Intent::General)
                .expect("general intent params missing")
        })
}

/// Phrases marking schedule tables, used by the date-intent prioritization
/// in the multi-entity path.
pub static SCHEDULE_PHRASES: &[&str] = &[
    "ভর্তি পরীক্ষার তারিখ ও সময়",
    "ভর্তি পরীক্ষার সময়সূচী",
    "পরীক্ষার তারিখ",
    "আবেদনের সময়সীমা",
    "আবেদনের সময়কাল",
    "সময়সূচি",
];

/// Bengali-numeral date forms, e.g. `২১ ডিসেম্বর ২০২৫` or `২০/১১/২০২৫`.
pub static BENGALI_DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[০-৯]{1,2}\s*(জানুয়ারি|ফেব্রুয়ারি|মার্চ|এপ্রিল|মে|জুন|জুলাই|আগস্ট|সেপ্টেম্বর|অক্টোবর|নভেম্বর|ডিসেম্বর)|[০-৯]{1,2}[/-][০-৯]{1,2}[/-][০-৯]{2,4}",
    )
    .expect("invalid Bengali date pattern")
});

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(query: &str) -> Intent {
        INTENT_PATTERNS
            .iter()
            .find(|(_, re)| re.is_match(query))
            .map(|(intent, _)| *intent)
            .unwrap_or(Intent::General)
    }

    #[test]
    fn test_date_intent_bengali() {
        assert_eq!(classify("চবির পরীক্ষার তারিখ কবে?"), Intent::Date);
        assert_eq!(classify("আবেদন কবে শুরু হবে"), Intent::Date);
    }

    #[test]
    fn test_fee_intent_banglish() {
        assert_eq!(classify("BUET er abedon fee koto taka?"), Intent::Fee);
        assert_eq!(classify("ভর্তি ফি কত?"), Intent::Fee);
    }

    #[test]
    fn test_admit_card_beats_date() {
        // Contains "কবে" but the admit-card pattern is checked first.
        assert_eq!(classify("প্রবেশপত্র কবে পাওয়া যাবে?"), Intent::AdmitCard);
    }

    #[test]
    fn test_seat_and_eligibility() {
        assert_eq!(classify("KU এর আসন কত?"), Intent::Seat);
        assert_eq!(classify("আবেদনের যোগ্যতা কী?"), Intent::Eligibility);
    }

    #[test]
    fn test_general_fallthrough() {
        assert_eq!(classify("ঢাকা বিশ্ববিদ্যালয় সম্পর্কে বলো"), Intent::General);
    }

    #[test]
    fn test_intent_params_complete() {
        for intent in [
            Intent::Date,
            Intent::Fee,
            Intent::Eligibility,
            Intent::Seat,
            Intent::AdmitCard,
            Intent::Website,
            Intent::Exam,
            Intent::General,
        ] {
            assert_eq!(intent_params(intent).intent, intent);
        }
    }

    #[test]
    fn test_bengali_date_pattern() {
        assert!(BENGALI_DATE_PATTERN.is_match("পরীক্ষা ২১ ডিসেম্বর ২০২৫ তারিখে"));
        assert!(BENGALI_DATE_PATTERN.is_match("আবেদনের সময়কাল: ২০/১১/২০২৫ থেকে"));
        assert!(!BENGALI_DATE_PATTERN.is_match("কোনো তারিখ নেই"));
    }
}
