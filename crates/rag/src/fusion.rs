//! Score fusion
//!
//! Two schemes:
//! - adaptive PPR+DPR blending for the single-entity path, weighted by how
//!   confident the fact matcher was;
//! - reciprocal rank fusion for multi-list merging (per-entity dense+sparse,
//!   and across decomposed sub-queries).

use std::collections::HashMap;

/// Min-max normalize scores into `[0, 1]` in place. A constant list maps to
/// all zeros (no ordering information to preserve).
pub fn min_max_normalize(scores: &mut [f32]) {
    let min = scores.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    if max > min {
        for s in scores.iter_mut() {
            *s = (*s - min) / (max - min);
        }
    } else {
        for s in scores.iter_mut() {
            *s = 0.0;
        }
    }
}

/// Adaptive fusion of PPR and DPR rankings.
///
/// Both lists are min-max normalized, then blended per passage with a PPR
/// weight that grows with `fact_confidence`: confident fact matches mean the
/// graph walk was well seeded, so its ordering deserves more trust; with no
/// confidence the blend leans on dense similarity. Ids missing from one list
/// contribute zero from that side.
pub fn adaptive_fuse(
    ppr: &[(String, f32)],
    dpr: &[(String, f32)],
    fact_confidence: f32,
) -> Vec<(String, f32)> {
    let confidence = fact_confidence.clamp(0.0, 1.0);
    let ppr_weight = 0.3 + 0.4 * confidence;
    let dpr_weight = 1.0 - ppr_weight;

    let normalize = |list: &[(String, f32)]| -> HashMap<String, f32> {
        let mut scores: Vec<f32> = list.iter().map(|(_, s)| *s).collect();
        min_max_normalize(&mut scores);
        list.iter()
            .map(|(id, _)| id.clone())
            .zip(scores)
            .collect()
    };

    let ppr_scores = normalize(ppr);
    let dpr_scores = normalize(dpr);

    let mut fused: HashMap<String, f32> = HashMap::new();
    for id in ppr_scores.keys().chain(dpr_scores.keys()) {
        if fused.contains_key(id) {
            continue;
        }
        let p = ppr_scores.get(id).copied().unwrap_or(0.0);
        let d = dpr_scores.get(id).copied().unwrap_or(0.0);
        fused.insert(id.clone(), ppr_weight * p + dpr_weight * d);
    }

    let mut out: Vec<(String, f32)> = fused.into_iter().collect();
    out.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    out
}

/// Reciprocal rank fusion: `score(d) = Σ 1/(k + rank_i(d))` over every input
/// list where `d` appears (ranks are 1-based). Ties break by the best
/// original score the document achieved in any list, then by id for
/// determinism.
pub fn rrf_fuse(lists: &[Vec<(String, f32)>], k: f32) -> Vec<(String, f32)> {
    let mut rrf: HashMap<String, f32> = HashMap::new();
    let mut best_original: HashMap<String, f32> = HashMap::new();

    for list in lists {
        for (rank, (id, original)) in list.iter().enumerate() {
            let contribution = 1.0 / (k + rank as f32 + 1.0);
            *rrf.entry(id.clone()).or_insert(0.0) += contribution;
            best_original
                .entry(id.clone())
                .and_modify(|b| *b = b.max(*original))
                .or_insert(*original);
        }
    }

    let mut out: Vec<(String, f32)> = rrf.into_iter().collect();
    out.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                let ba = best_original.get(&a.0).copied().unwrap_or(0.0);
                let bb = best_original.get(&b.0).copied().unwrap_or(0.0);
                bb.partial_cmp(&ba).unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.0.cmp(&b.0))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(pairs: &[(&str, f32)]) -> Vec<(String, f32)> {
        pairs.iter().map(|(id, s)| (id.to_string(), *s)).collect()
    }

    #[test]
    fn test_min_max_basics() {
        let mut scores = vec![2.0, 4.0, 6.0];
        min_max_normalize(&mut scores);
        assert_eq!(scores, vec![0.0, 0.5, 1.0]);

        let mut flat = vec![3.0, 3.0];
        min_max_normalize(&mut flat);
        assert_eq!(flat, vec![0.0, 0.0]);
    }

    #[test]
    fn test_rrf_formula() {
        let lists = vec![
            list(&[("a", 0.9), ("b", 0.8)]),
            list(&[("b", 0.7), ("c", 0.6)]),
        ];
        let fused = rrf_fuse(&lists, 60.0);
        let score_of = |id: &str| fused.iter().find(|(i, _)| i == id).unwrap().1;

        // b appears at rank 2 and rank 1.
        let expected_b = 1.0 / 62.0 + 1.0 / 61.0;
        assert!((score_of("b") - expected_b).abs() < 1e-6);
        let expected_a = 1.0 / 61.0;
        assert!((score_of("a") - expected_a).abs() < 1e-6);
        // b tops the fused list.
        assert_eq!(fused[0].0, "b");
    }

    #[test]
    fn test_rrf_tie_breaks_by_best_original_score() {
        // a and c get identical RRF contributions (same ranks in disjoint
        // lists); c carried the higher raw score.
        let lists = vec![list(&[("a", 0.2)]), list(&[("c", 0.9)])];
        let fused = rrf_fuse(&lists, 60.0);
        assert_eq!(fused[0].0, "c");
    }

    #[test]
    fn test_adaptive_high_confidence_favors_ppr() {
        let ppr = list(&[("graph_best", 1.0), ("other", 0.1)]);
        let dpr = list(&[("dense_best", 1.0), ("other", 0.1)]);

        let confident = adaptive_fuse(&ppr, &dpr, 1.0);
        let timid = adaptive_fuse(&ppr, &dpr, 0.0);

        let score = |fused: &[(String, f32)], id: &str| {
            fused.iter().find(|(i, _)| i == id).unwrap().1
        };
        assert!(score(&confident, "graph_best") > score(&confident, "dense_best"));
        assert!(score(&timid, "dense_best") > score(&timid, "graph_best"));
    }

    #[test]
    fn test_adaptive_missing_scores_default_zero() {
        let ppr = list(&[("only_ppr", 1.0)]);
        let dpr = list(&[("only_dpr", 1.0)]);
        let fused = adaptive_fuse(&ppr, &dpr, 0.5);
        assert_eq!(fused.len(), 2);
        for (_, score) in &fused {
            assert!(*score <= 1.0);
        }
    }

    #[test]
    fn test_fused_output_sorted() {
        let lists = vec![list(&[("a", 0.5), ("b", 0.4), ("c", 0.3)])];
        let fused = rrf_fuse(&lists, 60.0);
        for pair in fused.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }
}
