use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a stored vector. Sequential from 0 unless supplied
/// explicitly on `add`.
pub type VectorId = i64;

/// Sentinel id for padded result slots when the index holds fewer vectors
/// than requested.
pub const NO_ID: VectorId = -1;

/// One search hit: stored vector id and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: VectorId,
    pub distance: f32,
}

/// Distance metric, fixed at index construction and persisted with it.
///
/// `L2` is squared Euclidean. `InnerProduct` reports the *negated* dot
/// product as the distance so that ascending distance means nearest-first
/// for both metrics; pre-normalize vectors for cosine behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    L2,
    InnerProduct,
}

impl Metric {
    /// Distance between two same-length vectors (smaller is closer).
    #[must_use]
    pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::L2 => l2_sq(a, b),
            Self::InnerProduct => -dot(a, b),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::L2 => f.write_str("l2"),
            Self::InnerProduct => f.write_str("ip"),
        }
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "l2" => Ok(Self::L2),
            "ip" => Ok(Self::InnerProduct),
            other => Err(format!("unknown metric: {other}")),
        }
    }
}

/// The closed set of index topologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    Flat,
    IvfFlat,
    Pq,
    IvfPq,
}

impl IndexKind {
    /// Stable tag used in persisted artifact file names
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::IvfFlat => "ivf_flat",
            Self::Pq => "pq",
            Self::IvfPq => "ivf_pq",
        }
    }
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flat" => Ok(Self::Flat),
            "ivf_flat" => Ok(Self::IvfFlat),
            "pq" => Ok(Self::Pq),
            "ivf_pq" => Ok(Self::IvfPq),
            other => Err(format!("unknown index kind: {other}")),
        }
    }
}

/// Inverted-file tuning: number of coarse partitions and how many of them a
/// search probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IvfParams {
    pub nlist: usize,
    pub nprobe: usize,
}

impl Default for IvfParams {
    fn default() -> Self {
        Self {
            nlist: 100,
            nprobe: 1,
        }
    }
}

/// Product-quantization tuning: number of subspaces and bits per code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PqParams {
    pub m: usize,
    pub nbits: usize,
}

impl Default for PqParams {
    fn default() -> Self {
        Self { m: 8, nbits: 8 }
    }
}

impl PqParams {
    /// Centroids per subspace codebook
    #[must_use]
    pub const fn codebook_size(self) -> usize {
        1 << self.nbits
    }
}

/// k-means training controls. The seed makes training, and therefore
/// persistence round-trips of trained indexes, reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainParams {
    pub iterations: usize,
    pub seed: u64,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            iterations: 25,
            seed: 42,
        }
    }
}

/// Squared Euclidean distance
#[must_use]
pub(crate) fn l2_sq(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Dot product
#[must_use]
pub(crate) fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Keep the `k` nearest candidates, ties broken by lower id, padding with
/// `NO_ID` when fewer than `k` exist.
pub(crate) fn select_neighbors(mut candidates: Vec<Neighbor>, k: usize) -> Vec<Neighbor> {
    candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
    candidates.truncate(k);
    while candidates.len() < k {
        candidates.push(Neighbor {
            id: NO_ID,
            distance: f32::MAX,
        });
    }
    candidates
}
