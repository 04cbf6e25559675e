use crate::data::{Qrels, RunResults};
use crate::error::{EvalError, Result};
use crate::metrics;
use std::collections::BTreeMap;
use std::fmt;

/// Decimal places kept in reported scores
const REPORT_DECIMALS: i32 = 5;

/// Averaged scores for one run: metric label (`P@5`, `NDCG@10`, …) → score.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalReport {
    scores: BTreeMap<String, f64>,
    k_values: Vec<usize>,
    evaluated_queries: usize,
    skipped_queries: usize,
}

impl EvalReport {
    /// Score for a metric label, e.g. `report.get("NDCG@10")`
    #[must_use]
    pub fn get(&self, label: &str) -> Option<f64> {
        self.scores.get(label).copied()
    }

    #[must_use]
    pub fn scores(&self) -> &BTreeMap<String, f64> {
        &self.scores
    }

    /// Queries present in both the run and the judgments
    #[must_use]
    pub const fn evaluated_queries(&self) -> usize {
        self.evaluated_queries
    }

    /// Run queries that had no judgments and were left out of the averages
    #[must_use]
    pub const fn skipped_queries(&self) -> usize {
        self.skipped_queries
    }
}

const METRIC_NAMES: [&str; 6] = ["P", "Recall", "NDCG", "MAP", "MRR", "Hole"];

impl fmt::Display for EvalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} queries evaluated, {} skipped (no judgments)",
            self.evaluated_queries, self.skipped_queries
        )?;
        for name in METRIC_NAMES {
            for &k in &self.k_values {
                let label = format!("{name}@{k}");
                if let Some(score) = self.get(&label) {
                    writeln!(f, "{label:<12} {score:.5}")?;
                }
            }
        }
        Ok(())
    }
}

/// Score a run against ground-truth judgments at each requested cutoff.
///
/// Queries are ranked by descending score with a stable sort, so equal
/// scores keep a consistent order. A run query absent from the judgments is
/// skipped, not counted as zero; a judged query whose result set is empty
/// scores zero everywhere and stays in the averages. Averages are arithmetic
/// over the evaluated queries, rounded to five decimals.
pub fn evaluate(qrels: &Qrels, results: &RunResults, k_values: &[usize]) -> Result<EvalReport> {
    if k_values.is_empty() {
        return Err(EvalError::invalid_argument("no k values supplied"));
    }
    if k_values.contains(&0) {
        return Err(EvalError::invalid_argument("k values must be > 0"));
    }

    let mut k_values = k_values.to_vec();
    k_values.sort_unstable();
    k_values.dedup();

    let mut sums: BTreeMap<String, f64> = BTreeMap::new();
    let mut evaluated = 0usize;
    let mut skipped = 0usize;

    for (query_id, docs) in results.iter() {
        let Some(judgments) = qrels.get(query_id) else {
            log::debug!("query {query_id} has no judgments, skipping");
            skipped += 1;
            continue;
        };
        evaluated += 1;

        let mut scored: Vec<(&String, f32)> = docs.iter().map(|(id, &s)| (id, s)).collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        let ranked: Vec<String> = scored.into_iter().map(|(id, _)| id.clone()).collect();

        for &k in &k_values {
            *sums.entry(format!("P@{k}")).or_default() +=
                metrics::precision_at_k(&ranked, judgments, k);
            *sums.entry(format!("Recall@{k}")).or_default() +=
                metrics::recall_at_k(&ranked, judgments, k);
            *sums.entry(format!("NDCG@{k}")).or_default() +=
                metrics::ndcg_at_k(&ranked, judgments, k);
            *sums.entry(format!("MAP@{k}")).or_default() +=
                metrics::average_precision_at_k(&ranked, judgments, k);
            *sums.entry(format!("MRR@{k}")).or_default() +=
                metrics::reciprocal_rank_at_k(&ranked, judgments, k);
            *sums.entry(format!("Hole@{k}")).or_default() +=
                metrics::hole_rate_at_k(&ranked, judgments, k);
        }
    }

    if evaluated == 0 {
        log::warn!("no run query had judgments; every average is 0");
    }

    let scores = sums
        .into_iter()
        .map(|(label, sum)| {
            let mean = if evaluated == 0 {
                0.0
            } else {
                sum / evaluated as f64
            };
            (label, round_to(mean, REPORT_DECIMALS))
        })
        .collect();

    Ok(EvalReport {
        scores,
        k_values,
        evaluated_queries: evaluated,
        skipped_queries: skipped,
    })
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn single_query_fixture() -> Qrels {
        let mut qrels = Qrels::new();
        qrels.insert("q1", "d1", 1);
        qrels.insert("q1", "d2", 0);
        qrels
    }

    #[test]
    fn relevant_first_scores_perfectly_at_one() {
        let qrels = single_query_fixture();
        let mut run = RunResults::new();
        run.insert("q1", "d1", 0.9);
        run.insert("q1", "d3", 0.5);

        let report = evaluate(&qrels, &run, &[1]).unwrap();
        assert_eq!(report.get("P@1"), Some(1.0));
        assert_eq!(report.get("Recall@1"), Some(1.0));
        assert_eq!(report.get("Hole@1"), Some(0.0));
    }

    #[test]
    fn unjudged_doc_first_is_a_hole() {
        let qrels = single_query_fixture();
        let mut run = RunResults::new();
        run.insert("q1", "d3", 0.9);
        run.insert("q1", "d1", 0.5);

        let report = evaluate(&qrels, &run, &[1]).unwrap();
        assert_eq!(report.get("P@1"), Some(0.0));
        assert_eq!(report.get("Hole@1"), Some(1.0));
    }

    #[test]
    fn perfect_retrieval_maxes_rank_metrics() {
        let mut qrels = Qrels::new();
        let mut run = RunResults::new();
        for q in ["q1", "q2"] {
            for (i, doc) in ["a", "b", "c"].iter().enumerate() {
                qrels.insert(q, format!("{doc}-{q}"), 1);
                run.insert(q, format!("{doc}-{q}"), 1.0 - i as f32 * 0.1);
            }
        }

        let report = evaluate(&qrels, &run, &[1, 3]).unwrap();
        for k in [1, 3] {
            assert_eq!(report.get(&format!("P@{k}")), Some(1.0));
            assert_eq!(report.get(&format!("NDCG@{k}")), Some(1.0));
            assert_eq!(report.get(&format!("MRR@{k}")), Some(1.0));
        }
        assert_eq!(report.get("Recall@3"), Some(1.0));
        assert_eq!(report.get("MAP@3"), Some(1.0));
    }

    #[test]
    fn queries_without_judgments_are_excluded_not_zeroed() {
        let qrels = single_query_fixture();
        let mut run = RunResults::new();
        run.insert("q1", "d1", 0.9);
        // q-unknown would drag P@1 to 0.5 if it were counted as zero.
        run.insert("q-unknown", "d9", 0.9);

        let report = evaluate(&qrels, &run, &[1]).unwrap();
        assert_eq!(report.evaluated_queries(), 1);
        assert_eq!(report.skipped_queries(), 1);
        assert_eq!(report.get("P@1"), Some(1.0));
    }

    #[test]
    fn judged_query_with_empty_results_counts_as_zero() {
        let mut qrels = Qrels::new();
        qrels.insert("q1", "d1", 1);
        qrels.insert("q2", "d2", 1);

        let mut run = RunResults::new();
        run.insert("q1", "d1", 1.0);
        run.insert_empty("q2");

        let report = evaluate(&qrels, &run, &[1]).unwrap();
        assert_eq!(report.evaluated_queries(), 2);
        assert_eq!(report.get("P@1"), Some(0.5));
        assert_eq!(report.get("MRR@1"), Some(0.5));
    }

    #[test]
    fn averages_are_rounded_to_five_decimals() {
        let mut qrels = Qrels::new();
        for q in ["q1", "q2", "q3"] {
            qrels.insert(q, "d1", 1);
        }
        let mut run = RunResults::new();
        run.insert("q1", "d1", 1.0);
        run.insert_empty("q2");
        run.insert_empty("q3");

        let report = evaluate(&qrels, &run, &[1]).unwrap();
        assert_eq!(report.get("P@1"), Some(0.33333));
    }

    #[test]
    fn ranking_is_stable_for_tied_scores() {
        let mut qrels = Qrels::new();
        qrels.insert("q1", "a", 1);

        let mut run = RunResults::new();
        run.insert("q1", "a", 0.5);
        run.insert("q1", "b", 0.5);

        // Ties keep doc-id order, so "a" stays first.
        let report = evaluate(&qrels, &run, &[1]).unwrap();
        assert_eq!(report.get("P@1"), Some(1.0));
    }

    #[test]
    fn zero_and_empty_k_values_are_rejected() {
        let qrels = single_query_fixture();
        let run = RunResults::new();
        assert!(evaluate(&qrels, &run, &[]).is_err());
        assert!(evaluate(&qrels, &run, &[0, 5]).is_err());
    }

    #[test]
    fn report_prints_labels_in_metric_order() {
        let qrels = single_query_fixture();
        let mut run = RunResults::new();
        run.insert("q1", "d1", 0.9);

        let report = evaluate(&qrels, &run, &[1, 10]).unwrap();
        let printed = report.to_string();
        let p_pos = printed.find("P@1 ").unwrap();
        let ndcg_pos = printed.find("NDCG@1 ").unwrap();
        let hole_pos = printed.find("Hole@10 ").unwrap();
        assert!(p_pos < ndcg_pos && ndcg_pos < hole_pos);
    }
}
