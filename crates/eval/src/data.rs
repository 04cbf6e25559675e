use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Ground-truth relevance judgments: query id → doc id → integer grade.
///
/// Grade 0 means judged irrelevant; positive grades are degrees of
/// relevance. Read-only once loaded, consumed only by the evaluator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Qrels {
    judgments: BTreeMap<String, BTreeMap<String, i32>>,
}

impl Qrels {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, query_id: impl Into<String>, doc_id: impl Into<String>, grade: i32) {
        self.judgments
            .entry(query_id.into())
            .or_default()
            .insert(doc_id.into(), grade);
    }

    #[must_use]
    pub fn get(&self, query_id: &str) -> Option<&BTreeMap<String, i32>> {
        self.judgments.get(query_id)
    }

    #[must_use]
    pub fn query_count(&self) -> usize {
        self.judgments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.judgments.is_empty()
    }

    /// Load judgments from a tab-separated file of
    /// `query-id <TAB> doc-id <TAB> grade` rows. A header row is tolerated
    /// and skipped. Blank lines are ignored.
    pub fn from_tsv_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let mut qrels = Self::new();

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 3 {
                return Err(EvalError::malformed(
                    path,
                    number + 1,
                    format!("expected 3 tab-separated fields, got {}", fields.len()),
                ));
            }

            match fields[2].parse::<i32>() {
                Ok(grade) => qrels.insert(fields[0], fields[1], grade),
                // First row with a non-numeric grade column is a header.
                Err(_) if number == 0 => continue,
                Err(err) => {
                    return Err(EvalError::malformed(
                        path,
                        number + 1,
                        format!("bad grade {:?}: {err}", fields[2]),
                    ));
                }
            }
        }

        log::info!(
            "loaded judgments for {} queries from {path:?}",
            qrels.query_count()
        );
        Ok(qrels)
    }
}

/// One retrieval run: query id → doc id → score, higher is more relevant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResults {
    results: BTreeMap<String, BTreeMap<String, f32>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RunRecord {
    query_id: String,
    doc_id: String,
    score: f32,
}

impl RunResults {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, query_id: impl Into<String>, doc_id: impl Into<String>, score: f32) {
        self.results
            .entry(query_id.into())
            .or_default()
            .insert(doc_id.into(), score);
    }

    /// Record a query that retrieved nothing, so it still participates in
    /// evaluation.
    pub fn insert_empty(&mut self, query_id: impl Into<String>) {
        self.results.entry(query_id.into()).or_default();
    }

    #[must_use]
    pub fn get(&self, query_id: &str) -> Option<&BTreeMap<String, f32>> {
        self.results.get(query_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, f32>)> {
        self.results.iter()
    }

    #[must_use]
    pub fn query_count(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Load a run from JSON Lines of
    /// `{"query_id": …, "doc_id": …, "score": …}` records.
    pub fn from_jsonl_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let mut run = Self::new();

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: RunRecord = serde_json::from_str(&line)
                .map_err(|err| EvalError::malformed(path, number + 1, err.to_string()))?;
            run.insert(record.query_id, record.doc_id, record.score);
        }

        log::info!("loaded run for {} queries from {path:?}", run.query_count());
        Ok(run)
    }

    /// Write the run in the same JSON Lines shape `from_jsonl_path` reads.
    pub fn save_jsonl(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        for (query_id, docs) in &self.results {
            for (doc_id, &score) in docs {
                let record = RunRecord {
                    query_id: query_id.clone(),
                    doc_id: doc_id.clone(),
                    score,
                };
                serde_json::to_writer(&mut writer, &record)?;
                writer.write_all(b"\n")?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

/// One benchmark query / topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Query {
    #[serde(rename = "_id")]
    pub id: String,
    pub text: String,
}

/// Load topics from JSON Lines of `{"_id": …, "text": …}` records. Fields
/// beyond the two required ones are ignored.
pub fn load_queries_jsonl(path: impl AsRef<Path>) -> Result<Vec<Query>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut queries = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let query: Query = serde_json::from_str(&line)
            .map_err(|err| EvalError::malformed(path, number + 1, err.to_string()))?;
        queries.push(query);
    }

    log::info!("loaded {} queries from {path:?}", queries.len());
    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn qrels_tsv_with_header() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("qrels.tsv");
        std::fs::write(
            &path,
            "query-id\tcorpus-id\tscore\nq1\td1\t2\nq1\td2\t0\nq2\td3\t1\n",
        )
        .unwrap();

        let qrels = Qrels::from_tsv_path(&path).unwrap();
        assert_eq!(qrels.query_count(), 2);
        assert_eq!(qrels.get("q1").unwrap()["d1"], 2);
        assert_eq!(qrels.get("q1").unwrap()["d2"], 0);
    }

    #[test]
    fn qrels_tsv_without_header() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("qrels.tsv");
        std::fs::write(&path, "q1\td1\t1\n").unwrap();

        let qrels = Qrels::from_tsv_path(&path).unwrap();
        assert_eq!(qrels.get("q1").unwrap()["d1"], 1);
    }

    #[test]
    fn qrels_tsv_rejects_bad_rows() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("qrels.tsv");
        std::fs::write(&path, "q1\td1\t1\nq2\td2\n").unwrap();

        assert!(matches!(
            Qrels::from_tsv_path(&path),
            Err(EvalError::Malformed { line: 2, .. })
        ));
    }

    #[test]
    fn run_results_jsonl_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("run.jsonl");

        let mut run = RunResults::new();
        run.insert("q1", "3", 0.9);
        run.insert("q1", "7", 0.4);
        run.insert("q2", "1", 0.8);
        run.save_jsonl(&path).unwrap();

        let reloaded = RunResults::from_jsonl_path(&path).unwrap();
        assert_eq!(reloaded, run);
    }

    #[test]
    fn queries_jsonl_ignores_extra_fields() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("queries.jsonl");
        std::fs::write(
            &path,
            "{\"_id\": \"q1\", \"text\": \"what is rust\", \"metadata\": {}}\n\n{\"_id\": \"q2\", \"text\": \"borrow checker\"}\n",
        )
        .unwrap();

        let queries = load_queries_jsonl(&path).unwrap();
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0].id, "q1");
        assert_eq!(queries[1].text, "borrow checker");
    }
}
