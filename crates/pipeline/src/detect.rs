//! Entity, intent and coaching detection
//!
//! Pure functions over the raw query string, backed by the precompiled
//! tables in `bhorti_config::domain`. Bengali institution names match by
//! substring (word boundaries are unreliable for Bengali script); English
//! abbreviations match on word boundaries. Rules run in declaration order
//! and duplicates are suppressed by abbreviation.

use std::collections::HashSet;

use bhorti_config::domain::universities::{COACHING_QUERY_PATTERNS, COMPILED_UNIVERSITY_RULES};
use bhorti_config::domain::INTENT_PATTERNS;
use bhorti_core::{DetectedEntity, Intent};

/// Detect institutions mentioned in the query, in rule order.
pub fn detect_entities(query: &str) -> Vec<DetectedEntity> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut detected = Vec::new();

    for compiled in COMPILED_UNIVERSITY_RULES.iter() {
        let rule = compiled.rule;
        if seen.contains(rule.abbrev) {
            continue;
        }
        let bengali_hit = rule
            .bengali_markers
            .iter()
            .any(|marker| query.contains(marker));
        let english_hit = compiled.english.is_match(query);
        if bengali_hit || english_hit {
            seen.insert(rule.abbrev);
            detected.push(DetectedEntity {
                abbrev: rule.abbrev.to_string(),
                full_name: rule.full_name.to_string(),
            });
        }
    }

    detected
}

/// Classify the query intent; first matching pattern wins.
pub fn detect_intent(query: &str) -> Intent {
    INTENT_PATTERNS
        .iter()
        .find(|(_, pattern)| pattern.is_match(query))
        .map(|(intent, _)| *intent)
        .unwrap_or(Intent::General)
}

/// Is this a question about the coaching brand itself? Checked before
/// entity detection; a hit skips retrieval entirely.
pub fn is_coaching_query(query: &str) -> bool {
    COACHING_QUERY_PATTERNS
        .iter()
        .any(|pattern| pattern.is_match(query))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abbrevs(query: &str) -> Vec<String> {
        detect_entities(query)
            .into_iter()
            .map(|e| e.abbrev)
            .collect()
    }

    #[test]
    fn test_single_bengali_entity() {
        assert_eq!(abbrevs("চবির পরীক্ষার তারিখ কবে?"), vec!["cu"]);
    }

    #[test]
    fn test_multi_entity_english() {
        assert_eq!(
            abbrevs("BUET, KUET, RUET এর আবেদন ফি কত?"),
            vec!["buet", "kuet", "ruet"]
        );
    }

    #[test]
    fn test_kuet_does_not_add_ku() {
        let found = abbrevs("kuet admission test date");
        assert_eq!(found, vec!["kuet"]);
    }

    #[test]
    fn test_ku_alone_detected() {
        assert_eq!(abbrevs("KU এর আসন কত?"), vec!["ku"]);
    }

    #[test]
    fn test_jnu_vs_ju() {
        assert_eq!(abbrevs("জগন্নাথ বিশ্ববিদ্যালয়ের আসন?"), vec!["jnu"]);
        assert_eq!(abbrevs("জাহাঙ্গীরনগর বিশ্ববিদ্যালয়ের আসন?"), vec!["ju"]);
    }

    #[test]
    fn test_dedup_same_university_twice() {
        // Both the Bangla name and the abbreviation appear; one entity out.
        assert_eq!(abbrevs("ঢাকা বিশ্ববিদ্যালয় DU ভর্তি"), vec!["du"]);
    }

    #[test]
    fn test_detection_is_idempotent() {
        let query = "BUET ও ঢাবির ভর্তি তথ্য";
        assert_eq!(detect_entities(query), detect_entities(query));
    }

    #[test]
    fn test_no_entities() {
        assert!(abbrevs("ভর্তি পরীক্ষার প্রস্তুতি কেমন হওয়া উচিত?").is_empty());
    }

    #[test]
    fn test_intent_detection() {
        assert_eq!(detect_intent("চবির পরীক্ষার তারিখ কবে?"), Intent::Date);
        assert_eq!(detect_intent("BUET এর আবেদন ফি কত?"), Intent::Fee);
        assert_eq!(detect_intent("KU এর আসন কত?"), Intent::Seat);
        assert_eq!(detect_intent("ঢাবি সম্পর্কে জানাও"), Intent::General);
    }

    #[test]
    fn test_coaching_detection() {
        assert!(is_coaching_query("উদ্ভাস ব্যাচের সময় কখন?"));
        assert!(is_coaching_query("udvash er class routine?"));
        assert!(!is_coaching_query("বুয়েটের ভর্তি পরীক্ষা কবে?"));
    }
}
