use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to extract text from {path}: {reason}")]
    Extraction { path: String, reason: String },

    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Dimension mismatch in collection '{collection}': expected {expected}, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },

    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    #[error("{operation} timed out after {limit:?}")]
    Timeout { operation: String, limit: Duration },

    #[error("Failed to answer '{question}' from collection '{collection}': {source}")]
    Answering {
        question: String,
        collection: String,
        #[source]
        source: Box<Error>,
    },

    /// Failure reported by an answering capability. Pipelines surface it inside
    /// [`Error::Answering`].
    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("Persistence failed for collection '{collection}': {reason}")]
    Persistence { collection: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    pub fn extraction(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Extraction { path: path.into(), reason: reason.to_string() }
    }

    pub fn persistence(collection: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Persistence { collection: collection.into(), reason: reason.to_string() }
    }

    /// The innermost cause, looking through `Answering` wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::Answering { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
