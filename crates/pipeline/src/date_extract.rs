//! Deterministic exam-date extraction
//!
//! For date-intent single-entity questions a regex pass runs before the LLM:
//! candidate passages are first narrowed by the university's marker rules,
//! then matched against the known circular formats. A hit becomes ground
//! truth that the synthesis prompt instructs the model to echo.
//!
//! The pattern table is grouped by source-format family; supporting a new
//! circular layout means one more row here, not new control flow.

use once_cell::sync::Lazy;
use regex::Regex;

use bhorti_config::domain::universities::filter_rule;
use bhorti_rag::ScoredDoc;

const MONTHS: &str = "জানুয়ারি|ফেব্রুয়ারি|মার্চ|এপ্রিল|মে|জুন|জুলাই|আগস্ট|সেপ্টেম্বর|অক্টোবর|নভেম্বর|ডিসেম্বর";

struct DateFormat {
    /// Which institutions publish in this layout; empty = any.
    abbrevs: &'static [&'static str],
    pattern: &'static str,
}

/// Format families, most specific first. Capture group 1 is the date text.
static DATE_FORMATS: &[DateFormat] = &[
    // KUET/RUET circulars: schedule table row "ভর্তি পরীক্ষার তারিখ ও সময় : <date>".
    DateFormat {
        abbrevs: &["kuet", "ruet"],
        pattern: r"ভর্তি পরীক্ষার তারিখ(?:\s*ও\s*সময়)?\s*[:ঃ]?\s*([০-৯0-9]{1,2}\s*(?:MONTHS)[,\s]*[০-৯0-9]{4})",
    },
    // CUET circulars: prose "ভর্তি পরীক্ষা <date> তারিখে অনুষ্ঠিত হবে".
    DateFormat {
        abbrevs: &["cuet"],
        pattern: r"ভর্তি পরীক্ষা\s*([০-৯0-9]{1,2}\s*(?:MONTHS)\s*[০-৯0-9]{4})\s*তারিখে",
    },
    // BUET circulars: table "পরীক্ষার তারিখ: <date> (<day>)".
    DateFormat {
        abbrevs: &["buet"],
        pattern: r"পরীক্ষার তারিখ\s*[:ঃ]\s*([০-৯0-9]{1,2}\s*(?:MONTHS)\s*[০-৯0-9]{4})",
    },
    // Generic fallbacks shared by the public universities.
    DateFormat {
        abbrevs: &[],
        pattern: r"ভর্তি পরীক্ষা\s*([০-৯0-9]{1,2}\s*(?:MONTHS)\s*[০-৯0-9]{4})\s*তারিখে",
    },
    DateFormat {
        abbrevs: &[],
        pattern: r"ভর্তি পরীক্ষা\s*[:ঃ]\s*([০-৯0-9]{1,2}\s*(?:MONTHS)\s*[০-৯0-9]{4})",
    },
    DateFormat {
        abbrevs: &[],
        pattern: r"পরীক্ষার তারিখ\s*[:ঃ]?\s*([০-৯0-9]{1,2}\s*(?:MONTHS)\s*[০-৯0-9]{4})",
    },
];

static COMPILED_FORMATS: Lazy<Vec<(&'static DateFormat, Regex)>> = Lazy::new(|| {
    DATE_FORMATS
        .iter()
        .map(|format| {
            let pattern = format.pattern.replace("MONTHS", MONTHS);
            (
                format,
                Regex::new(&pattern).expect("invalid date format pattern"),
            )
        })
        .collect()
});

/// Does this passage belong to the institution, by its marker rules?
fn passes_markers(text_lower: &str, abbrev: &str) -> bool {
    match filter_rule(abbrev) {
        Some(rule) => {
            !rule
                .must_not_contain
                .iter()
                .any(|m| text_lower.contains(&m.to_lowercase()))
                && rule
                    .must_contain
                    .iter()
                    .any(|m| text_lower.contains(&m.to_lowercase()))
        }
        None => true,
    }
}

/// Extract the exam date for one institution from ranked passages.
///
/// Passages are visited in score order; within a passage, format families
/// registered for the institution are tried before the generic ones.
pub fn extract_exam_date_regex(abbrev: &str, docs: &[ScoredDoc]) -> Option<String> {
    for doc in docs {
        let lower = doc.text.to_lowercase();
        if !passes_markers(&lower, abbrev) {
            continue;
        }
        for (format, regex) in COMPILED_FORMATS.iter() {
            if !format.abbrevs.is_empty() && !format.abbrevs.contains(&abbrev) {
                continue;
            }
            if let Some(captures) = regex.captures(&doc.text) {
                if let Some(date) = captures.get(1) {
                    let date = date.as_str().trim().to_string();
                    tracing::debug!(abbrev, date = %date, "exam date extracted by regex");
                    return Some(date);
                }
            }
        }
    }
    None
}
