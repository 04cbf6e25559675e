//! # ragprobe Vector Index
//!
//! Stores chunk vectors under one of four index topologies and answers
//! k-nearest-neighbor queries over them.
//!
//! ## Topologies
//!
//! ```text
//! Vectors
//!     │
//!     ├──> flat      exhaustive scan, exact distances
//!     ├──> ivf_flat  coarse k-means partitions, probe nearest lists only
//!     ├──> pq        product-quantized codes, asymmetric distance tables
//!     └──> ivf_pq    coarse partitions + residual product quantization
//! ```
//!
//! All four share one surface: `train` (a no-op for flat), `add`, `search`,
//! `save`/`load`. Distances are squared Euclidean or negated inner product,
//! so ascending distance always means nearest-first; callers pre-normalize
//! vectors when they want cosine behavior. Training is seeded, so a trained
//! index round-trips deterministically through persistence.
//!
//! ## Example
//!
//! ```rust
//! use ragprobe_vector_index::{Metric, VectorIndex};
//!
//! let mut index = VectorIndex::flat(3, Metric::L2);
//! index.add(&[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]).unwrap();
//!
//! let hits = index.search(&[vec![0.9, 0.1, 0.0]], 1).unwrap();
//! assert_eq!(hits[0][0].id, 0);
//! ```

mod error;
mod flat;
mod index;
mod ivf;
mod kmeans;
mod pq;
mod types;

pub use error::{Result, VectorIndexError};
pub use index::VectorIndex;
pub use types::{
    IndexKind, IvfParams, Metric, Neighbor, PqParams, TrainParams, VectorId, NO_ID,
};
