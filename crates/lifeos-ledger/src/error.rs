use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by a storage backend. Surfaced to callers as-is; nothing
/// here is retried internally.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot lock {}: {source}", path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid storage configuration: {0}")]
    Config(String),

    #[error("storage connection poisoned by a panicked writer")]
    Poisoned,
}

/// Failures of the commit orchestrator.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("{0} must not be empty")]
    MissingIdentifier(&'static str),

    #[error("idempotency key must not be empty")]
    EmptyIdempotencyKey,

    #[error("todo #{index} is malformed: {reason}")]
    MalformedCandidate { index: usize, reason: String },

    #[error("cannot derive idempotency key: {0}")]
    KeyDerivation(#[source] serde_json::Error),

    #[error(transparent)]
    Backend(#[from] StoreError),
}

impl CommitError {
    /// True when the request itself is at fault rather than the backend.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            CommitError::MissingIdentifier(_)
                | CommitError::EmptyIdempotencyKey
                | CommitError::MalformedCandidate { .. }
        )
    }
}
