use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn ragprobe() -> Command {
    Command::cargo_bin("ragprobe").expect("binary")
}

fn write_docs(root: &Path) {
    let docs = root.join("docs");
    fs::create_dir_all(&docs).unwrap();
    fs::write(docs.join("a.txt"), "alpha beta gamma.\n").unwrap();
    fs::write(docs.join("b.txt"), "totally different content.\n").unwrap();
}

fn index_docs(root: &Path) {
    ragprobe()
        .current_dir(root)
        .args(["index", "--docs", "docs", "--out", "data"])
        .assert()
        .success();
}

#[test]
fn index_writes_both_artifacts() {
    let temp = TempDir::new().unwrap();
    write_docs(temp.path());
    index_docs(temp.path());

    assert!(temp.path().join("data/max_chunks.json").is_file());
    assert!(temp.path().join("data/max_flat_index").is_file());

    // The chunk table is a bare JSON array in document order.
    let chunks: Vec<String> =
        serde_json::from_slice(&fs::read(temp.path().join("data/max_chunks.json")).unwrap())
            .unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0], "alpha beta gamma.\n");
}

#[test]
fn search_prints_ranked_chunks() {
    let temp = TempDir::new().unwrap();
    write_docs(temp.path());
    index_docs(temp.path());

    ragprobe()
        .current_dir(temp.path())
        .args(["search", "--out", "data", "--query", "alpha beta gamma.\n"])
        .assert()
        .success()
        .stdout(predicate::str::contains("alpha beta gamma"))
        .stdout(predicate::str::contains("chunk 0"));
}

#[test]
fn run_then_evaluate_reports_metrics() {
    let temp = TempDir::new().unwrap();
    write_docs(temp.path());
    index_docs(temp.path());

    fs::write(
        temp.path().join("queries.jsonl"),
        "{\"_id\": \"q1\", \"text\": \"alpha beta gamma.\\n\"}\n",
    )
    .unwrap();
    // Chunk 0 is a.txt's only chunk; the identical query must rank it first.
    fs::write(temp.path().join("qrels.tsv"), "q1\t0\t1\n").unwrap();

    ragprobe()
        .current_dir(temp.path())
        .args([
            "run",
            "--out",
            "data",
            "--queries",
            "queries.jsonl",
            "--results",
            "results.jsonl",
            "--k",
            "2",
        ])
        .assert()
        .success();

    ragprobe()
        .current_dir(temp.path())
        .args([
            "evaluate",
            "--qrels",
            "qrels.tsv",
            "--results",
            "results.jsonl",
            "--k",
            "1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 queries evaluated"))
        .stdout(predicate::str::contains("P@1"))
        .stdout(predicate::str::contains("1.00000"));
}

#[test]
fn index_fails_without_documents() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("docs")).unwrap();

    ragprobe()
        .current_dir(temp.path())
        .args(["index", "--docs", "docs", "--out", "data"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no .txt documents"));
}
