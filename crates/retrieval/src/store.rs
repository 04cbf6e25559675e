use crate::chunk_table::ChunkTable;
use crate::embedder::Embedder;
use crate::error::{RetrievalError, Result};
use crate::paths::{chunk_table_path, index_path};
use ragprobe_chunker::ChunkStrategy;
use ragprobe_vector_index::{
    IndexKind, IvfParams, Metric, PqParams, TrainParams, VectorId, VectorIndex,
};
use std::path::Path;

/// Index construction choices for a store build
#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    pub kind: IndexKind,
    pub metric: Metric,
    pub ivf: IvfParams,
    pub pq: PqParams,
    pub train: TrainParams,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            kind: IndexKind::Flat,
            metric: Metric::L2,
            ivf: IvfParams::default(),
            pq: PqParams::default(),
            train: TrainParams::default(),
        }
    }
}

/// A chunk table and its vector index, kept as one unit.
///
/// Search ids are positions in the chunk table, so the two artifacts are
/// only valid together. This type is the sole constructor and mutator of
/// the pair: `build` embeds and adds with sequential ids, `save` writes both
/// files, and `load` refuses a pair whose counts disagree. Regenerating one
/// artifact without the other cannot happen through this API.
pub struct RetrievalStore {
    chunks: ChunkTable,
    index: VectorIndex,
}

impl RetrievalStore {
    /// Embed `chunks`, train the index on the full chunk-vector sample when
    /// its topology needs training, and add every vector under its chunk's
    /// position as the id.
    pub async fn build(
        chunks: Vec<String>,
        embedder: &dyn Embedder,
        config: StoreConfig,
    ) -> Result<Self> {
        log::info!(
            "building {} store over {} chunks ({})",
            config.kind,
            chunks.len(),
            config.metric
        );
        let vectors = embedder.embed(&chunks).await?;
        if vectors.len() != chunks.len() {
            return Err(RetrievalError::embedding(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let mut index = VectorIndex::with_kind(
            config.kind,
            embedder.dimension(),
            config.metric,
            config.ivf,
            config.pq,
            config.train,
        )?;
        if !index.is_trained() {
            index.train(&vectors)?;
        }
        index.add(&vectors)?;

        Ok(Self {
            chunks: ChunkTable::from_chunks(chunks),
            index,
        })
    }

    /// Chunk text behind a search hit
    #[must_use]
    pub fn chunk(&self, id: VectorId) -> Option<&str> {
        self.chunks.get(id)
    }

    #[must_use]
    pub const fn chunk_table(&self) -> &ChunkTable {
        &self.chunks
    }

    #[must_use]
    pub const fn index(&self) -> &VectorIndex {
        &self.index
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Write both artifacts under `dir`: `{strategy}_chunks.json` and
    /// `{strategy}_{kind}_index`.
    pub async fn save(&self, dir: impl AsRef<Path>, strategy: ChunkStrategy) -> Result<()> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;
        self.chunks.save(chunk_table_path(dir, strategy)).await?;
        self.index
            .save(index_path(dir, strategy, self.index.kind()))?;
        Ok(())
    }

    /// Read back a pair written by [`save`](Self::save). Fails with a
    /// corruption error when the two files disagree about what they hold.
    pub async fn load(
        dir: impl AsRef<Path>,
        strategy: ChunkStrategy,
        kind: IndexKind,
    ) -> Result<Self> {
        let dir = dir.as_ref();
        let chunks = ChunkTable::load(chunk_table_path(dir, strategy)).await?;
        let index = VectorIndex::load(index_path(dir, strategy, kind))?;

        if index.kind() != kind {
            return Err(RetrievalError::corrupt(format!(
                "index file for {kind} actually holds a {} index",
                index.kind()
            )));
        }
        if chunks.len() != index.len() {
            return Err(RetrievalError::corrupt(format!(
                "chunk table holds {} chunks but the index holds {} vectors",
                chunks.len(),
                index.len()
            )));
        }

        Ok(Self { chunks, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashEmbedder;
    use tempfile::TempDir;

    fn chunk_fixture() -> Vec<String> {
        (0..12)
            .map(|i| format!("chunk number {i} talks about topic {}.\n", i % 3))
            .collect()
    }

    #[tokio::test]
    async fn build_assigns_positional_ids() {
        let embedder = HashEmbedder::new(16);
        let chunks = chunk_fixture();
        let store = RetrievalStore::build(chunks.clone(), &embedder, StoreConfig::default())
            .await
            .unwrap();

        assert_eq!(store.len(), chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(store.chunk(i as VectorId), Some(chunk.as_str()));
        }
    }

    #[tokio::test]
    async fn save_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let embedder = HashEmbedder::new(16);
        let store = RetrievalStore::build(chunk_fixture(), &embedder, StoreConfig::default())
            .await
            .unwrap();
        store.save(temp.path(), ChunkStrategy::MaxFill).await.unwrap();

        let reloaded = RetrievalStore::load(temp.path(), ChunkStrategy::MaxFill, IndexKind::Flat)
            .await
            .unwrap();
        assert_eq!(reloaded.len(), store.len());
        assert_eq!(reloaded.chunk(0), store.chunk(0));
    }

    #[tokio::test]
    async fn load_rejects_count_mismatch() {
        let temp = TempDir::new().unwrap();
        let embedder = HashEmbedder::new(16);
        let store = RetrievalStore::build(chunk_fixture(), &embedder, StoreConfig::default())
            .await
            .unwrap();
        store.save(temp.path(), ChunkStrategy::MaxFill).await.unwrap();

        // Regenerate the chunk table with one chunk missing, as a broken
        // external writer would.
        let mut chunks = chunk_fixture();
        chunks.pop();
        ChunkTable::from_chunks(chunks)
            .save(chunk_table_path(temp.path(), ChunkStrategy::MaxFill))
            .await
            .unwrap();

        assert!(matches!(
            RetrievalStore::load(temp.path(), ChunkStrategy::MaxFill, IndexKind::Flat).await,
            Err(RetrievalError::StoreCorrupt(_))
        ));
    }

    #[tokio::test]
    async fn trained_topology_builds_from_chunk_sample() {
        let embedder = HashEmbedder::new(16);
        let config = StoreConfig {
            kind: IndexKind::IvfFlat,
            ivf: IvfParams {
                nlist: 2,
                nprobe: 2,
            },
            ..Default::default()
        };
        let store = RetrievalStore::build(chunk_fixture(), &embedder, config)
            .await
            .unwrap();
        assert!(store.index().is_trained());
        assert_eq!(store.index().len(), store.len());
    }
}
