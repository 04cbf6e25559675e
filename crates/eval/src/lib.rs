//! # ragprobe Evaluator
//!
//! Scores a retrieval run against ground-truth relevance judgments using
//! standard rank metrics, averaged across queries at each requested cutoff.
//!
//! ## Metrics
//!
//! | Label | Meaning |
//! |-------|---------|
//! | `P@k` | fraction of the top-k that is relevant |
//! | `Recall@k` | fraction of the relevant set found in the top-k |
//! | `NDCG@k` | position-discounted graded gain, normalized by the ideal ordering |
//! | `MAP@k` | precision at each relevant rank, over the total relevant count |
//! | `MRR@k` | reciprocal rank of the first relevant hit |
//! | `Hole@k` | fraction of the top-k the judgments never saw |
//!
//! Queries in the run but absent from the judgments are excluded from the
//! averages rather than scored as zero; a judged query that retrieved
//! nothing scores zero and stays in.
//!
//! ## Example
//!
//! ```rust
//! use ragprobe_eval::{evaluate, Qrels, RunResults};
//!
//! let mut qrels = Qrels::new();
//! qrels.insert("q1", "d1", 1);
//!
//! let mut run = RunResults::new();
//! run.insert("q1", "d1", 0.9);
//!
//! let report = evaluate(&qrels, &run, &[1]).unwrap();
//! assert_eq!(report.get("P@1"), Some(1.0));
//! ```

mod data;
mod error;
pub mod metrics;
mod report;

pub use data::{load_queries_jsonl, Qrels, Query, RunResults};
pub use error::{EvalError, Result};
pub use report::{evaluate, EvalReport};
