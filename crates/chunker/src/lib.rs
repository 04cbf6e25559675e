//! # ragprobe Chunker
//!
//! Splits raw document text into bounded-length retrievable chunks.
//!
//! ## Pipeline
//!
//! ```text
//! Document text
//!     │
//!     ├──> Separator split (newline, sentence punctuation)
//!     │      └─> separators stay attached to the preceding segment,
//!     │          so concatenating the output reproduces the input
//!     │
//!     ├──> Midpoint bisection of any segment longer than max_len
//!     │
//!     └──> Greedy accumulation per strategy
//!          ├─> max-fill: fill up to max_len, then flush
//!          ├─> min-fill: flush once past min_len, capped at max_len
//!          └─> passthrough: one chunk per segment
//! ```
//!
//! Chunk order matches document order; downstream indexing uses the position
//! in the returned sequence as the chunk id.
//!
//! ## Example
//!
//! ```rust
//! use ragprobe_chunker::{Chunker, ChunkerConfig, ChunkStrategy};
//!
//! let config = ChunkerConfig {
//!     min_len: 10,
//!     max_len: 100,
//!     strategy: ChunkStrategy::MaxFill,
//!     ..Default::default()
//! };
//! let chunker = Chunker::new(config).unwrap();
//!
//! let chunks = chunker.split("First sentence.\nSecond sentence.\n");
//! assert!(chunks.iter().all(|c| !c.is_empty()));
//! ```

mod chunker;
mod config;
mod error;

pub use chunker::Chunker;
pub use config::{ChunkStrategy, ChunkerConfig, DEFAULT_MAX_LEN, DEFAULT_MIN_LEN};
pub use error::{ChunkerError, Result};
