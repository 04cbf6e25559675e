//! Per-query rank metrics.
//!
//! Each function takes the candidate ids of one query, already ranked best
//! first, plus that query's judgments (doc id → integer grade, 0 = judged
//! irrelevant). All cutoffs are over the top `k` ranked candidates.

use std::collections::BTreeMap;

fn grade(judgments: &BTreeMap<String, i32>, id: &str) -> i32 {
    judgments.get(id).copied().unwrap_or(0)
}

fn is_relevant(judgments: &BTreeMap<String, i32>, id: &str) -> bool {
    grade(judgments, id) > 0
}

fn relevant_count(judgments: &BTreeMap<String, i32>) -> usize {
    judgments.values().filter(|&&g| g > 0).count()
}

/// Fraction of the top-k slots holding a relevant document.
#[must_use]
pub fn precision_at_k(ranked: &[String], judgments: &BTreeMap<String, i32>, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    let hits = ranked
        .iter()
        .take(k)
        .filter(|id| is_relevant(judgments, id))
        .count();
    hits as f64 / k as f64
}

/// Fraction of the query's relevant documents found in the top-k. 0 when the
/// query has no relevant documents.
#[must_use]
pub fn recall_at_k(ranked: &[String], judgments: &BTreeMap<String, i32>, k: usize) -> f64 {
    let total = relevant_count(judgments);
    if total == 0 {
        return 0.0;
    }
    let hits = ranked
        .iter()
        .take(k)
        .filter(|id| is_relevant(judgments, id))
        .count();
    hits as f64 / total as f64
}

/// Normalized discounted cumulative gain over the top-k.
///
/// Linear gain, position `i` (1-indexed) discounted by `1 / log2(i + 1)`.
/// The ideal ordering ranks every judged-relevant document by descending
/// grade. 0 when the ideal gain is 0.
#[must_use]
pub fn ndcg_at_k(ranked: &[String], judgments: &BTreeMap<String, i32>, k: usize) -> f64 {
    let dcg: f64 = ranked
        .iter()
        .take(k)
        .enumerate()
        .map(|(i, id)| f64::from(grade(judgments, id).max(0)) / ((i + 2) as f64).log2())
        .sum();

    let mut ideal: Vec<i32> = judgments.values().copied().filter(|&g| g > 0).collect();
    ideal.sort_unstable_by(|a, b| b.cmp(a));
    let idcg: f64 = ideal
        .iter()
        .take(k)
        .enumerate()
        .map(|(i, &g)| f64::from(g) / ((i + 2) as f64).log2())
        .sum();

    if idcg == 0.0 {
        0.0
    } else {
        dcg / idcg
    }
}

/// Average precision over the top-k: precision taken at each rank holding a
/// relevant document, summed, then divided by the query's *total* relevant
/// count (not the count reachable within k).
#[must_use]
pub fn average_precision_at_k(
    ranked: &[String],
    judgments: &BTreeMap<String, i32>,
    k: usize,
) -> f64 {
    let total = relevant_count(judgments);
    if total == 0 {
        return 0.0;
    }

    let mut hits = 0usize;
    let mut sum = 0.0;
    for (i, id) in ranked.iter().take(k).enumerate() {
        if is_relevant(judgments, id) {
            hits += 1;
            sum += hits as f64 / (i + 1) as f64;
        }
    }
    sum / total as f64
}

/// Reciprocal of the 1-indexed rank of the first relevant document in the
/// top-k, 0 when none is found.
#[must_use]
pub fn reciprocal_rank_at_k(ranked: &[String], judgments: &BTreeMap<String, i32>, k: usize) -> f64 {
    ranked
        .iter()
        .take(k)
        .position(|id| is_relevant(judgments, id))
        .map_or(0.0, |i| 1.0 / (i + 1) as f64)
}

/// Fraction of the top-k slots holding a document absent from the judgment
/// set entirely (neither relevant nor judged irrelevant). High hole rates
/// mean the run is surfacing documents the ground truth never saw.
#[must_use]
pub fn hole_rate_at_k(ranked: &[String], judgments: &BTreeMap<String, i32>, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    let holes = ranked
        .iter()
        .take(k)
        .filter(|id| !judgments.contains_key(id.as_str()))
        .count();
    holes as f64 / k as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    fn judgments(pairs: &[(&str, i32)]) -> BTreeMap<String, i32> {
        pairs
            .iter()
            .map(|(id, g)| (id.to_string(), *g))
            .collect()
    }

    #[test]
    fn precision_counts_relevant_slots() {
        let j = judgments(&[("a", 1), ("b", 0), ("c", 2)]);
        let ranked = ids(&["a", "b", "c", "x"]);

        assert_eq!(precision_at_k(&ranked, &j, 1), 1.0);
        assert_eq!(precision_at_k(&ranked, &j, 2), 0.5);
        assert_eq!(precision_at_k(&ranked, &j, 4), 0.5);
    }

    #[test]
    fn recall_is_zero_without_relevant_docs() {
        let j = judgments(&[("a", 0)]);
        assert_eq!(recall_at_k(&ids(&["a"]), &j, 5), 0.0);
    }

    #[test]
    fn recall_counts_found_fraction() {
        let j = judgments(&[("a", 1), ("b", 2), ("c", 1)]);
        let ranked = ids(&["a", "x", "b"]);

        assert_eq!(recall_at_k(&ranked, &j, 1), 1.0 / 3.0);
        assert_eq!(recall_at_k(&ranked, &j, 3), 2.0 / 3.0);
    }

    #[test]
    fn ndcg_rewards_high_grades_early() {
        let j = judgments(&[("best", 3), ("ok", 1)]);

        assert_eq!(ndcg_at_k(&ids(&["best", "ok"]), &j, 2), 1.0);
        let swapped = ndcg_at_k(&ids(&["ok", "best"]), &j, 2);
        assert!(swapped > 0.0 && swapped < 1.0);
    }

    #[test]
    fn ndcg_without_judged_relevance_is_zero() {
        let j = judgments(&[("a", 0)]);
        assert_eq!(ndcg_at_k(&ids(&["a"]), &j, 3), 0.0);
    }

    #[test]
    fn average_precision_uses_total_relevant_denominator() {
        let j = judgments(&[("a", 1), ("b", 1)]);
        // Only one of two relevant docs retrieved, at rank 1.
        let ap = average_precision_at_k(&ids(&["a", "x"]), &j, 2);
        assert_eq!(ap, 0.5);
    }

    #[test]
    fn reciprocal_rank_finds_first_hit() {
        let j = judgments(&[("a", 1)]);
        assert_eq!(reciprocal_rank_at_k(&ids(&["x", "y", "a"]), &j, 3), 1.0 / 3.0);
        assert_eq!(reciprocal_rank_at_k(&ids(&["x", "y", "a"]), &j, 2), 0.0);
    }

    #[test]
    fn hole_rate_counts_unjudged_only() {
        let j = judgments(&[("a", 1), ("b", 0)]);
        // "b" is judged (irrelevant), so it is not a hole.
        let ranked = ids(&["a", "b", "zzz"]);
        assert_eq!(hole_rate_at_k(&ranked, &j, 3), 1.0 / 3.0);
    }
}
