use crate::embedder::Embedder;
use crate::error::{RetrievalError, Result};
use crate::store::RetrievalStore;
use ragprobe_eval::{Query, RunResults};
use ragprobe_vector_index::{VectorId, NO_ID};

/// One retrieved chunk. `score` is the negated distance, so higher always
/// means more relevant regardless of the index metric.
#[derive(Debug, Clone, PartialEq)]
pub struct Retrieved {
    pub id: VectorId,
    pub text: String,
    pub distance: f32,
    pub score: f32,
}

/// Query-time orchestration: embed the query, search the index, map hit ids
/// back to chunk text. Holds no state of its own beyond the borrowed
/// embedder and store, so one pipeline can serve concurrent read-only
/// callers.
pub struct RetrievalPipeline<'a> {
    embedder: &'a dyn Embedder,
    store: &'a RetrievalStore,
}

impl<'a> RetrievalPipeline<'a> {
    #[must_use]
    pub fn new(embedder: &'a dyn Embedder, store: &'a RetrievalStore) -> Self {
        Self { embedder, store }
    }

    /// Top-`k` chunks for `query`, most relevant first. Padded no-match
    /// slots from an underfilled index are dropped, so fewer than `k`
    /// results may come back.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Retrieved>> {
        let texts = [query.to_string()];
        let vectors = self.embedder.embed(&texts).await?;
        let hits = self.store.index().search(&vectors, k)?;

        let mut retrieved = Vec::with_capacity(k);
        for neighbor in &hits[0] {
            if neighbor.id == NO_ID {
                continue;
            }
            let text = self.store.chunk(neighbor.id).ok_or_else(|| {
                RetrievalError::corrupt(format!("search returned id {} with no chunk", neighbor.id))
            })?;
            retrieved.push(Retrieved {
                id: neighbor.id,
                text: text.to_string(),
                distance: neighbor.distance,
                score: -neighbor.distance,
            });
        }
        log::debug!("retrieved {} of {k} chunks for query", retrieved.len());
        Ok(retrieved)
    }

    /// Answer every query and collect the scores as a run for offline
    /// evaluation. Chunk ids become decimal doc ids. A query that retrieves
    /// nothing still appears in the run, with no docs.
    pub async fn run(&self, queries: &[Query], k: usize) -> Result<RunResults> {
        let mut results = RunResults::new();
        for query in queries {
            results.insert_empty(&query.id);
            for hit in self.retrieve(&query.text, k).await? {
                results.insert(&query.id, hit.id.to_string(), hit.score);
            }
        }
        Ok(results)
    }
}
