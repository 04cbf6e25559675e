use crate::error::{Result, VectorIndexError};
use crate::flat::FlatIndex;
use crate::ivf::{IvfFlatIndex, IvfPqIndex};
use crate::pq::PqIndex;
use crate::types::{IndexKind, IvfParams, Metric, Neighbor, PqParams, TrainParams, VectorId};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const INDEX_SCHEMA_VERSION: u32 = 1;

/// A k-nearest-neighbor index over fixed-dimension vectors.
///
/// One of four topologies, chosen at construction and fixed for the index's
/// lifetime. All topologies share the same surface: `train` (a no-op for
/// flat), `add`, `search`, `save`/`load`. The metric is also fixed at
/// construction and persisted with the index, so train, add and search always
/// agree on it.
pub struct VectorIndex {
    inner: Topology,
}

/// Closed set of topology implementations. Dispatch is a `match` per
/// operation; no string tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Topology {
    Flat(FlatIndex),
    IvfFlat(IvfFlatIndex),
    Pq(PqIndex),
    IvfPq(IvfPqIndex),
}

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    schema_version: u32,
    index: Topology,
}

impl VectorIndex {
    /// Exhaustive-scan index. Needs no training.
    #[must_use]
    pub fn flat(dim: usize, metric: Metric) -> Self {
        Self {
            inner: Topology::Flat(FlatIndex::new(dim, metric)),
        }
    }

    /// Inverted-file index with `ivf.nlist` coarse partitions.
    pub fn ivf_flat(
        dim: usize,
        metric: Metric,
        ivf: IvfParams,
        train: TrainParams,
    ) -> Result<Self> {
        validate_ivf(ivf)?;
        Ok(Self {
            inner: Topology::IvfFlat(IvfFlatIndex::new(dim, metric, ivf, train)),
        })
    }

    /// Product-quantized index with `pq.m` subspaces of `dim / pq.m`
    /// components each.
    pub fn pq(dim: usize, metric: Metric, pq: PqParams, train: TrainParams) -> Result<Self> {
        validate_pq(dim, pq)?;
        Ok(Self {
            inner: Topology::Pq(PqIndex::new(dim, metric, pq, train)),
        })
    }

    /// Composite index: coarse inverted-file partitions with
    /// product-quantized residuals inside each partition.
    pub fn ivf_pq(
        dim: usize,
        metric: Metric,
        ivf: IvfParams,
        pq: PqParams,
        train: TrainParams,
    ) -> Result<Self> {
        validate_ivf(ivf)?;
        validate_pq(dim, pq)?;
        Ok(Self {
            inner: Topology::IvfPq(IvfPqIndex::new(dim, metric, ivf, pq, train)),
        })
    }

    /// Construct any topology from its kind tag. Param structs that the kind
    /// does not use are ignored.
    pub fn with_kind(
        kind: IndexKind,
        dim: usize,
        metric: Metric,
        ivf: IvfParams,
        pq: PqParams,
        train: TrainParams,
    ) -> Result<Self> {
        match kind {
            IndexKind::Flat => Ok(Self::flat(dim, metric)),
            IndexKind::IvfFlat => Self::ivf_flat(dim, metric, ivf, train),
            IndexKind::Pq => Self::pq(dim, metric, pq, train),
            IndexKind::IvfPq => Self::ivf_pq(dim, metric, ivf, pq, train),
        }
    }

    #[must_use]
    pub fn kind(&self) -> IndexKind {
        match &self.inner {
            Topology::Flat(_) => IndexKind::Flat,
            Topology::IvfFlat(_) => IndexKind::IvfFlat,
            Topology::Pq(_) => IndexKind::Pq,
            Topology::IvfPq(_) => IndexKind::IvfPq,
        }
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        match &self.inner {
            Topology::Flat(index) => index.dim,
            Topology::IvfFlat(index) => index.dim,
            Topology::Pq(index) => index.dim,
            Topology::IvfPq(index) => index.dim,
        }
    }

    #[must_use]
    pub fn metric(&self) -> Metric {
        match &self.inner {
            Topology::Flat(index) => index.metric,
            Topology::IvfFlat(index) => index.metric,
            Topology::Pq(index) => index.metric,
            Topology::IvfPq(index) => index.metric,
        }
    }

    /// Number of stored vectors
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.inner {
            Topology::Flat(index) => index.len(),
            Topology::IvfFlat(index) => index.len(),
            Topology::Pq(index) => index.len(),
            Topology::IvfPq(index) => index.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `add`/`search` are allowed. Flat is always trained.
    #[must_use]
    pub fn is_trained(&self) -> bool {
        match &self.inner {
            Topology::Flat(_) => true,
            Topology::IvfFlat(index) => index.is_trained(),
            Topology::Pq(index) => index.is_trained(),
            Topology::IvfPq(index) => index.is_trained(),
        }
    }

    /// Learn topology parameters from a representative sample: coarse
    /// partition centroids for IVF, per-subspace codebooks for PQ, both for
    /// the composite. A no-op for flat. Re-training a trained index is
    /// rejected.
    pub fn train(&mut self, sample: &[Vec<f32>]) -> Result<()> {
        if matches!(self.inner, Topology::Flat(_)) {
            return Ok(());
        }
        if self.is_trained() {
            return Err(VectorIndexError::invalid_argument(
                "index is already trained",
            ));
        }
        if sample.is_empty() {
            return Err(VectorIndexError::invalid_argument(
                "training sample is empty",
            ));
        }
        self.check_dimensions(sample)?;

        let required = self.required_sample();
        if sample.len() < required {
            return Err(VectorIndexError::invalid_argument(format!(
                "training sample of {} vectors is smaller than the {} clusters requested",
                sample.len(),
                required
            )));
        }

        log::info!(
            "training {} index on {} sample vectors",
            self.kind(),
            sample.len()
        );
        match &mut self.inner {
            Topology::Flat(_) => unreachable!(),
            Topology::IvfFlat(index) => index.train(sample),
            Topology::Pq(index) => index.train(sample),
            Topology::IvfPq(index) => index.train(sample),
        }
        Ok(())
    }

    /// Append vectors with sequential ids starting at the current count.
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<()> {
        let start = self.len() as VectorId;
        let ids: Vec<VectorId> = (start..start + vectors.len() as VectorId).collect();
        self.add_with_ids(vectors, &ids)
    }

    /// Append vectors under caller-chosen ids.
    pub fn add_with_ids(&mut self, vectors: &[Vec<f32>], ids: &[VectorId]) -> Result<()> {
        if vectors.len() != ids.len() {
            return Err(VectorIndexError::invalid_argument(format!(
                "{} vectors but {} ids",
                vectors.len(),
                ids.len()
            )));
        }
        if !self.is_trained() {
            return Err(VectorIndexError::NotTrained);
        }
        self.check_dimensions(vectors)?;

        match &mut self.inner {
            Topology::Flat(index) => index.add(vectors, ids),
            Topology::IvfFlat(index) => index.add(vectors, ids),
            Topology::Pq(index) => index.add(vectors, ids),
            Topology::IvfPq(index) => index.add(vectors, ids),
        }
        log::debug!("added {} vectors, total {}", vectors.len(), self.len());
        Ok(())
    }

    /// For each query, the `k` nearest stored vectors ascending by distance,
    /// ties broken by lower id. When fewer than `k` vectors are reachable the
    /// result is padded with `NO_ID` / `f32::MAX` slots.
    pub fn search(&self, queries: &[Vec<f32>], k: usize) -> Result<Vec<Vec<Neighbor>>> {
        if k == 0 {
            return Err(VectorIndexError::invalid_argument("k must be > 0"));
        }
        if !self.is_trained() {
            return Err(VectorIndexError::NotTrained);
        }
        self.check_dimensions(queries)?;

        Ok(queries
            .iter()
            .map(|query| match &self.inner {
                Topology::Flat(index) => index.search_one(query, k),
                Topology::IvfFlat(index) => index.search_one(query, k),
                Topology::Pq(index) => index.search_one(query, k),
                Topology::IvfPq(index) => index.search_one(query, k),
            })
            .collect())
    }

    /// Serialize the full index state to `path`, atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let persisted = PersistedIndex {
            schema_version: INDEX_SCHEMA_VERSION,
            index: self.inner.clone(),
        };
        let bytes = serde_json::to_vec(&persisted)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, path)?;
        log::info!("saved {} index ({} vectors) to {path:?}", self.kind(), self.len());
        Ok(())
    }

    /// Restore an index persisted by [`save`](Self::save). Malformed or
    /// truncated input is reported as `IndexCorrupt`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let persisted: PersistedIndex = serde_json::from_slice(&bytes)
            .map_err(|err| VectorIndexError::corrupt(format!("{path:?}: {err}")))?;
        if persisted.schema_version != INDEX_SCHEMA_VERSION {
            return Err(VectorIndexError::corrupt(format!(
                "unsupported schema_version {} (expected {INDEX_SCHEMA_VERSION})",
                persisted.schema_version
            )));
        }
        let index = Self {
            inner: persisted.index,
        };
        log::info!(
            "loaded {} index ({} vectors) from {path:?}",
            index.kind(),
            index.len()
        );
        Ok(index)
    }

    /// Smallest sample `train` accepts for this topology.
    fn required_sample(&self) -> usize {
        match &self.inner {
            Topology::Flat(_) => 0,
            Topology::IvfFlat(index) => index.params.nlist,
            Topology::Pq(index) => index.params.codebook_size(),
            Topology::IvfPq(index) => index.ivf.nlist.max(index.pq.codebook_size()),
        }
    }

    fn check_dimensions(&self, vectors: &[Vec<f32>]) -> Result<()> {
        let expected = self.dimension();
        for vector in vectors {
            if vector.len() != expected {
                return Err(VectorIndexError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
        }
        Ok(())
    }
}

fn validate_ivf(ivf: IvfParams) -> Result<()> {
    if ivf.nlist == 0 {
        return Err(VectorIndexError::invalid_argument("nlist must be > 0"));
    }
    if ivf.nprobe == 0 {
        return Err(VectorIndexError::invalid_argument("nprobe must be > 0"));
    }
    Ok(())
}

fn validate_pq(dim: usize, pq: PqParams) -> Result<()> {
    if pq.m == 0 || dim % pq.m != 0 {
        return Err(VectorIndexError::invalid_argument(format!(
            "dimension {dim} is not divisible into {} subspaces",
            pq.m
        )));
    }
    // Codes are stored as one byte per subspace.
    if pq.nbits == 0 || pq.nbits > 8 {
        return Err(VectorIndexError::invalid_argument(format!(
            "nbits must be in 1..=8, got {}",
            pq.nbits
        )));
    }
    Ok(())
}
