//! # ragprobe Retrieval
//!
//! Orchestrates chunks, embeddings and a vector index into a queryable
//! retrieval store.
//!
//! ## Pieces
//!
//! ```text
//! chunks ──> Embedder ──> vectors ──> VectorIndex
//!    │                                    │
//!    └────────── RetrievalStore ──────────┘
//!                      │
//!              RetrievalPipeline
//!                      │
//!        query ──> top-k chunks / RunResults
//! ```
//!
//! The [`Embedder`] trait is the seam for the actual embedding model, which
//! is out of scope here; [`HashEmbedder`] is a deterministic stand-in for
//! tests and plumbing checks. [`RetrievalStore`] owns the chunk table and
//! the index as one unit so their positional-id coupling cannot drift, and
//! [`RetrievalPipeline`] answers queries against a built store.

mod chunk_table;
mod embedder;
mod error;
pub mod paths;
mod pipeline;
mod store;

pub use chunk_table::ChunkTable;
pub use embedder::{Embedder, HashEmbedder, DEFAULT_DIMENSION};
pub use error::{Result, RetrievalError};
pub use pipeline::{Retrieved, RetrievalPipeline};
pub use store::{RetrievalStore, StoreConfig};
