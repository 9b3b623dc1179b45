pub mod backend;
pub mod commit;
pub mod config;
pub mod error;
pub mod file_store;
pub mod lock;
pub mod paths;
pub mod sqlite_store;

#[cfg(test)]
mod conformance;

pub use backend::{CommitTodosParams, PersistenceBackend};
pub use commit::{
    commit_derived_from_transcript, derive_idempotency_key, validate_candidates, CommitRequest,
};
pub use config::{open_backend, BackendKind, StorageConfig};
pub use error::{CommitError, StoreError};
pub use file_store::FileStore;
pub use lock::FileLock;
pub use sqlite_store::SqliteStore;
