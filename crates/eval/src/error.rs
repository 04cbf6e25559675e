use thiserror::Error;

/// Result type for evaluation operations
pub type Result<T> = std::result::Result<T, EvalError>;

/// Errors that can occur while loading inputs or configuring an evaluation
#[derive(Error, Debug)]
pub enum EvalError {
    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed qrels / results / queries input
    #[error("Malformed input at {path} line {line}: {reason}")]
    Malformed {
        path: String,
        line: usize,
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl EvalError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn malformed(path: &std::path::Path, line: usize, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.display().to_string(),
            line,
            reason: reason.into(),
        }
    }
}
