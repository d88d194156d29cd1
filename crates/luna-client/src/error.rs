//! Node repository errors

use thiserror::Error;

/// Errors that can occur when reading or mutating node records
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Referenced node, group, switch or interface does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Mutation would break a uniqueness constraint (name, MAC, IP)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Backend refused the mutation
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Backend failure unrelated to the request
    #[error("Backend error: {0}")]
    Backend(String),

    /// State file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
