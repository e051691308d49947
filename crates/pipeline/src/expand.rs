//! Query expansion
//!
//! Stateless: the original query plus deduplicated expansion terms from the
//! static vocabulary. Latin-script keys match on word boundaries so `du`
//! never fires inside `education`; Bengali keys match by substring. Intent
//! keyword bundles and triggered semantic equivalences are appended last.

use std::collections::HashSet;

use bhorti_config::domain::{intent_expansion_terms, EQUIVALENCES, SYNONYM_BUNDLES};
use bhorti_core::Intent;

fn is_latin_key(key: &str) -> bool {
    key.chars().all(|c| c.is_ascii())
}

/// Word-boundary containment for Latin keys over a lowercased query.
fn latin_word_hit(query_lower: &str, key: &str) -> bool {
    query_lower.split(|c: char| !c.is_alphanumeric()).any(|token| token == key)
}

/// Expand a query for retrieval. Output preserves the original text and
/// appends each new term exactly once, in table order.
pub fn expand_query(query: &str, intent: Intent) -> String {
    let query_lower = query.to_lowercase();
    let mut seen: HashSet<String> = HashSet::new();
    let mut additions: Vec<&str> = Vec::new();

    let mut push = |term: &'static str, seen: &mut HashSet<String>, additions: &mut Vec<&str>| {
        let lower = term.to_lowercase();
        if !query_lower.contains(&lower) && seen.insert(lower) {
            additions.push(term);
        }
    };

    for bundle in SYNONYM_BUNDLES {
        let hit = if is_latin_key(bundle.key) {
            latin_word_hit(&query_lower, bundle.key)
        } else {
            query.contains(bundle.key)
        };
        if hit {
            for term in bundle.expansions {
                push(term, &mut seen, &mut additions);
            }
        }
    }

    for term in intent_expansion_terms(intent) {
        push(term, &mut seen, &mut additions);
    }

    for equivalence in EQUIVALENCES {
        if query.contains(equivalence.trigger) {
            for term in equivalence.equivalents {
                push(term, &mut seen, &mut additions);
            }
        }
    }

    if additions.is_empty() {
        query.to_string()
    } else {
        format!("{} {}", query, additions.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviation_expands_to_full_names() {
        let expanded = expand_query("cu exam date", Intent::Date);
        assert!(expanded.contains("চট্টগ্রাম বিশ্ববিদ্যালয়"));
        assert!(expanded.contains("Chittagong University"));
        assert!(expanded.starts_with("cu exam date"));
    }

    #[test]
    fn test_latin_key_needs_word_boundary() {
        // "du" must not fire inside "education".
        let expanded = expand_query("higher education info", Intent::General);
        assert!(!expanded.contains("ঢাকা বিশ্ববিদ্যালয়"));
    }

    #[test]
    fn test_bengali_key_substring_match() {
        let expanded = expand_query("চবির ভর্তি তথ্য", Intent::General);
        assert!(expanded.contains("চট্টগ্রাম বিশ্ববিদ্যালয়"));
    }

    #[test]
    fn test_intent_terms_appended() {
        let expanded = expand_query("বুয়েট সম্পর্কে", Intent::Date);
        assert!(expanded.contains("ভর্তি পরীক্ষার তারিখ"));
    }

    #[test]
    fn test_equivalence_injected() {
        let expanded = expand_query("মানবিক শাখার যোগ্যতা", Intent::Eligibility);
        assert!(expanded.contains("অ-বিজ্ঞান শাখা"));
    }

    #[test]
    fn test_no_duplicates() {
        let expanded = expand_query("kobe tarikh", Intent::Date);
        let count = expanded.matches("তারিখ").count();
        assert_eq!(count, 1, "expanded: {}", expanded);
    }

    #[test]
    fn test_idempotent_modulo_order() {
        // Expanding an already-expanded query adds nothing new.
        let once = expand_query("cu ভর্তি তারিখ কবে", Intent::Date);
        let twice = expand_query(&once, Intent::Date);
        let set = |s: &str| {
            s.split_whitespace()
                .map(str::to_string)
                .collect::<std::collections::HashSet<_>>()
        };
        assert_eq!(set(&once), set(&twice));
    }

    #[test]
    fn test_no_trigger_no_change() {
        assert_eq!(
            expand_query("random unrelated text", Intent::General),
            "random unrelated text"
        );
    }
}
