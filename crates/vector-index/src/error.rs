use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorIndexError>;

#[derive(Error, Debug)]
pub enum VectorIndexError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Index requires training before this operation")]
    NotTrained,

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Corrupt index file: {0}")]
    IndexCorrupt(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl VectorIndexError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::IndexCorrupt(msg.into())
    }
}
