//! University filter
//!
//! Post-retrieval inclusion/exclusion by marker phrases, driven by the
//! per-institution tables in `bhorti_config::domain::universities`. Marker
//! matching is case-folded substring search over the passage text; the
//! bracketed index-time tags make the common case cheap and unambiguous.

use bhorti_config::domain::universities::{filter_rule, COACHING_ABBREV};

use crate::{sort_by_score_desc, ScoredDoc};

/// Count how many `must_contain` markers hit, or `None` when a
/// `must_not_contain` marker fires or nothing matches.
fn marker_matches(text_lower: &str, abbrev: &str) -> Option<usize> {
    let rule = filter_rule(abbrev)?;
    if rule
        .must_not_contain
        .iter()
        .any(|marker| text_lower.contains(&marker.to_lowercase()))
    {
        return None;
    }
    let hits = rule
        .must_contain
        .iter()
        .filter(|marker| text_lower.contains(&marker.to_lowercase()))
        .count();
    if hits > 0 {
        Some(hits)
    } else {
        None
    }
}

/// Non-strict filtering: keep matching passages, re-rank by marker count
/// then score — and if the filter would remove everything, return the input
/// untouched (degrading beats losing all context).
pub fn filter_documents_by_university(docs: Vec<ScoredDoc>, abbrev: &str) -> Vec<ScoredDoc> {
    if filter_rule(abbrev).is_none() {
        return docs;
    }

    let mut kept: Vec<(usize, ScoredDoc)> = docs
        .iter()
        .filter_map(|doc| {
            marker_matches(&doc.text.to_lowercase(), abbrev).map(|hits| (hits, doc.clone()))
        })
        .collect();

    if kept.is_empty() {
        tracing::debug!(abbrev, "university filter matched nothing, keeping original list");
        return docs;
    }

    kept.sort_by(|a, b| {
        b.0.cmp(&a.0).then_with(|| {
            b.1.score
                .partial_cmp(&a.1.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    });
    kept.into_iter().map(|(_, doc)| doc).collect()
}

/// Strict filtering for the single-entity path.
///
/// Only marker-matching passages survive. The coaching abbreviation always
/// yields empty (no coaching corpus exists; the controller answers with the
/// canned response). For real institutions an empty match falls back to the
/// unfiltered head of the list so the answer stage still has context; a
/// short match (≥ 1 but < `min_docs`) is returned as-is.
pub fn strict_university_filter(
    docs: Vec<ScoredDoc>,
    abbrev: &str,
    min_docs: usize,
) -> Vec<ScoredDoc> {
    if abbrev == COACHING_ABBREV {
        return Vec::new();
    }
    if filter_rule(abbrev).is_none() {
        return docs;
    }

    let mut kept: Vec<ScoredDoc> = docs
        .iter()
        .filter(|doc| marker_matches(&doc.text.to_lowercase(), abbrev).is_some())
        .cloned()
        .collect();

    if kept.is_empty() {
        tracing::debug!(
            abbrev,
            min_docs,
            "strict filter empty, falling back to unfiltered head"
        );
        return docs.into_iter().take(min_docs).collect();
    }

    sort_by_score_desc(&mut kept);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, text: &str, score: f32) -> ScoredDoc {
        ScoredDoc::new(id, text, score)
    }

    fn mixed_corpus() -> Vec<ScoredDoc> {
        vec![
            doc(
                "kuet1",
                "[খুলনা প্রকৌশল ও প্রযুক্তি বিশ্ববিদ্যালয় KUET] কুয়েট ভর্তি পরীক্ষা ১০ জানুয়ারি",
                0.9,
            ),
            doc(
                "ku1",
                "[খুলনা বিশ্ববিদ্যালয় KU] খুলনা বিশ্ববিদ্যালয় আসন সংখ্যা ১২০০",
                0.8,
            ),
            doc("du1", "[ঢাকা বিশ্ববিদ্যালয় DU] ঢাবি ভর্তি বিজ্ঞপ্তি", 0.7),
        ]
    }

    #[test]
    fn test_strict_ku_rejects_kuet() {
        let kept = strict_university_filter(mixed_corpus(), "ku", 3);
        // KUET passage contains "কুয়েট" which is in ku's must_not list.
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "ku1");
    }

    #[test]
    fn test_strict_kuet_keeps_only_kuet() {
        let kept = strict_university_filter(mixed_corpus(), "kuet", 3);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "kuet1");
    }

    #[test]
    fn test_strict_coaching_always_empty() {
        let kept = strict_university_filter(mixed_corpus(), COACHING_ABBREV, 3);
        assert!(kept.is_empty());
    }

    #[test]
    fn test_strict_no_match_falls_back_to_head() {
        let corpus = vec![
            doc("x", "irrelevant text", 0.9),
            doc("y", "more irrelevant", 0.8),
            doc("z", "still irrelevant", 0.7),
            doc("w", "noise", 0.6),
        ];
        let kept = strict_university_filter(corpus, "ju", 3);
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[0].id, "x");
    }

    #[test]
    fn test_non_strict_keeps_original_when_empty() {
        let corpus = vec![doc("x", "nothing relevant", 0.5)];
        let kept = filter_documents_by_university(corpus.clone(), "cu");
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "x");
    }

    #[test]
    fn test_non_strict_ranks_by_marker_count() {
        let corpus = vec![
            doc("weak", "চবি ভর্তি", 0.95),
            doc(
                "strong",
                "[চট্টগ্রাম বিশ্ববিদ্যালয় CU] চট্টগ্রাম বিশ্ববিদ্যালয় চবি ভর্তি পরীক্ষা",
                0.5,
            ),
        ];
        let kept = filter_documents_by_university(corpus, "cu");
        // More markers beats higher score.
        assert_eq!(kept[0].id, "strong");
    }

    #[test]
    fn test_ju_jnu_disambiguation() {
        let corpus = vec![
            doc("ju1", "জাহাঙ্গীরনগর বিশ্ববিদ্যালয় আবেদনের সময়সীমা", 0.9),
            doc("jnu1", "জগন্নাথ বিশ্ববিদ্যালয় ইউনিট-A বিজ্ঞান অনুষদ", 0.85),
        ];
        let ju = strict_university_filter(corpus.clone(), "ju", 1);
        assert_eq!(ju.len(), 1);
        assert_eq!(ju[0].id, "ju1");
        let jnu = strict_university_filter(corpus, "jnu", 1);
        assert_eq!(jnu.len(), 1);
        assert_eq!(jnu[0].id, "jnu1");
    }

    #[test]
    fn test_filter_invariant_markers_hold() {
        // For every kept doc, at least one must_contain marker is a
        // substring and no must_not marker is.
        let kept = strict_university_filter(mixed_corpus(), "ku", 3);
        let rule = filter_rule("ku").unwrap();
        for doc in &kept {
            let lower = doc.text.to_lowercase();
            assert!(rule
                .must_contain
                .iter()
                .any(|m| lower.contains(&m.to_lowercase())));
            assert!(!rule
                .must_not_contain
                .iter()
                .any(|m| lower.contains(&m.to_lowercase())));
        }
    }
}
