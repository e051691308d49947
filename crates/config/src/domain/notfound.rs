//! Not-found categories and templates
//!
//! When retrieval produces nothing, or the answer model says it found
//! nothing, the responder classifies the question into a category and returns
//! a fixed Bengali template pointing at the right official source.

use once_cell::sync::Lazy;
use regex::Regex;

use super::universities::{self, COACHING_ABBREV};

/// Not-found category, in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundCategory {
    /// Coaching-brand questions (also serves the retrieval short-circuit).
    Udvash,
    Medical,
    Engineering,
    /// A specific detected university.
    University,
    GstCluster,
    Default,
}

/// Keyword tables per category, checked against the lowercased question.
pub static MEDICAL_KEYWORDS: &[&str] = &[
    "মেডিকেল",
    "মেডিক্যাল",
    "এমবিবিএস",
    "mbbs",
    "bds",
    "ডেন্টাল",
    "dental",
];

pub static ENGINEERING_KEYWORDS: &[&str] = &[
    "ইঞ্জিনিয়ারিং",
    "প্রকৌশল",
    "engineering",
    "বুয়েট",
    "buet",
    "কুয়েট",
    "kuet",
    "রুয়েট",
    "ruet",
    "চুয়েট",
    "cuet",
];

pub static GST_KEYWORDS: &[&str] = &["গুচ্ছ", "gst", "guccho"];

pub static UDVASH_KEYWORDS: &[&str] = &["উদ্ভাস", "udvash", "উন্মেষ", "unmesh"];

/// Phrases that mark an LLM answer as "nothing found". English phrases plus
/// the specific Bengali sentences our prompts emit; generic Bengali negation
/// (`নেই`, `না`) is deliberately absent to avoid false positives on grounded
/// answers that merely contain a negation.
pub static NOT_FOUND_PHRASES: &[&str] = &[
    "information not found",
    "not found in the provided",
    "no information available",
    "i don't have that information",
    "দুঃখিত, আপনার প্রশ্নের সঠিক উত্তর দেওয়ার জন্য প্রয়োজনীয় তথ্য আমার কাছে নেই",
    "প্রয়োজনীয় তথ্য আমার কাছে নেই",
];

static UDVASH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)উদ্ভাস|উন্মেষ|\budvash\b|\bunmesh\b").expect("udvash pattern"));

/// Classify a question into a not-found category.
///
/// `detected_abbrev` is the first university detected in the question, if
/// any, and takes precedence over the keyword sweeps.
pub fn classify(question: &str, detected_abbrev: Option<&str>) -> NotFoundCategory {
    if UDVASH_PATTERN.is_match(question) {
        return NotFoundCategory::Udvash;
    }
    let lowered = question.to_lowercase();
    if MEDICAL_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        return NotFoundCategory::Medical;
    }
    if let Some(abbrev) = detected_abbrev {
        if abbrev != COACHING_ABBREV {
            return NotFoundCategory::University;
        }
    }
    if ENGINEERING_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        return NotFoundCategory::Engineering;
    }
    if GST_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        return NotFoundCategory::GstCluster;
    }
    NotFoundCategory::Default
}

/// Canned response for coaching-brand questions (also used by the retrieval
/// short-circuit).
pub fn coaching_response() -> String {
    format!(
        "উদ্ভাস-উন্মেষ সম্পর্কিত তথ্যের জন্য (ক্লাস রুটিন, ব্যাচের সময়, কোর্স ফি) সরাসরি \
         উদ্ভাসের অফিসিয়াল ওয়েবসাইট দেখুন: {}\n\nভর্তি বিজ্ঞপ্তি সংক্রান্ত যেকোনো প্রশ্ন \
         আমাকে করতে পারেন।",
        universities::official_website(COACHING_ABBREV).unwrap_or("https://udvash.com/HomePage")
    )
}

/// Build the not-found response for a category.
pub fn response(category: NotFoundCategory, detected_abbrev: Option<&str>) -> String {
    match category {
        NotFoundCategory::Udvash => coaching_response(),
        NotFoundCategory::Medical => format!(
            "দুঃখিত, মেডিকেল ভর্তি সংক্রান্ত এই তথ্যটি এই মুহূর্তে আমার কাছে নেই।\n\n\
             মেডিকেল ও ডেন্টাল ভর্তির সর্বশেষ আপডেটের জন্য স্বাস্থ্য অধিদপ্তরের অফিসিয়াল \
             ওয়েবসাইট দেখুন: {}",
            universities::official_website("medical").unwrap_or("https://dghs.gov.bd")
        ),
        NotFoundCategory::Engineering => format!(
            "দুঃখিত, প্রকৌশল বিশ্ববিদ্যালয় ভর্তি সংক্রান্ত এই তথ্যটি এই মুহূর্তে আমার কাছে \
             নেই।\n\nসংশ্লিষ্ট বিশ্ববিদ্যালয়ের অফিসিয়াল ওয়েবসাইটে সর্বশেষ বিজ্ঞপ্তি দেখুন \
             (যেমন বুয়েট: {})।",
            universities::official_website("buet").unwrap_or("https://www.buet.ac.bd")
        ),
        NotFoundCategory::University => {
            let site = detected_abbrev
                .and_then(universities::official_website)
                .unwrap_or("সংশ্লিষ্ট বিশ্ববিদ্যালয়ের অফিসিয়াল ওয়েবসাইট");
            let name = detected_abbrev
                .and_then(universities::university_rule)
                .map(|r| r.full_name)
                .unwrap_or("এই বিশ্ববিদ্যালয়");
            format!(
                "দুঃখিত, {} সম্পর্কিত এই তথ্যটি এই মুহূর্তে আমার কাছে নেই।\n\n\
                 সর্বশেষ ভর্তি বিজ্ঞপ্তির জন্য অফিসিয়াল ওয়েবসাইট দেখুন: {}",
                name, site
            )
        }
        NotFoundCategory::GstCluster => format!(
            "দুঃখিত, গুচ্ছ ভর্তি সংক্রান্ত এই তথ্যটি এই মুহূর্তে আমার কাছে নেই।\n\n\
             গুচ্ছ ভর্তির সর্বশেষ আপডেট দেখুন: {}",
            universities::official_website("gst").unwrap_or("https://gstadmission.ac.bd")
        ),
        NotFoundCategory::Default => "দুঃখিত, আপনার প্রশ্নের সঠিক উত্তর দেওয়ার জন্য প্রয়োজনীয় \
             তথ্য আমার কাছে নেই। অনুগ্রহ করে সংশ্লিষ্ট প্রতিষ্ঠানের অফিসিয়াল ওয়েবসাইটে সর্বশেষ \
             বিজ্ঞপ্তি দেখুন।"
            .to_string(),
    }
}

/// Does an LLM answer amount to "nothing found"?
///
/// Only the first 200 characters are inspected: the canned openings appear at
/// the start, and a grounded answer that merely *quotes* a not-found phrase
/// deeper in its body must not be reclassified.
pub fn answer_is_not_found(answer: &str) -> bool {
    let head: String = answer.chars().take(200).collect::<String>().to_lowercase();
    NOT_FOUND_PHRASES.iter().any(|p| head.contains(p))
}
