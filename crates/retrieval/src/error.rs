use thiserror::Error;

/// Result type for retrieval operations
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur while building, persisting or querying a store
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Embedding backend failure
    #[error("Embedding failed: {0}")]
    EmbeddingError(String),

    /// Persisted store state is inconsistent or unreadable
    #[error("Corrupt store: {0}")]
    StoreCorrupt(String),

    /// Index-level failure
    #[error(transparent)]
    Index(#[from] ragprobe_vector_index::VectorIndexError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl RetrievalError {
    /// Create an embedding error
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::EmbeddingError(msg.into())
    }

    /// Create a corrupt-store error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::StoreCorrupt(msg.into())
    }
}
