//! Error types for the EGO core library.

use thiserror::Error;

/// Top-level error type for all EGO core operations.
#[derive(Error, Debug)]
pub enum EgoError {
    /// The incoming event is missing required fields. Rejected before
    /// any graph or store mutation.
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// A memory record referenced by id was not found.
    #[error("Memory not found: {0}")]
    MemoryNotFound(crate::MemoryId),

    /// The embedding provider failed to produce a vector.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, EgoError>;
