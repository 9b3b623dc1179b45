//! Explicit backend selection, resolved once at startup.

use std::path::PathBuf;
use std::sync::Arc;

use crate::backend::PersistenceBackend;
use crate::error::StoreError;
use crate::file_store::FileStore;
use crate::paths::{default_data_dir, FILE_DB_NAME, SQLITE_DB_NAME};
use crate::sqlite_store::SqliteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Single JSON document guarded by a lock file.
    #[default]
    File,
    /// SQLite database with unique constraints and immediate transactions.
    Sqlite,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::File => "file",
            BackendKind::Sqlite => "sqlite",
        }
    }

    fn default_file_name(self) -> &'static str {
        match self {
            BackendKind::File => FILE_DB_NAME,
            BackendKind::Sqlite => SQLITE_DB_NAME,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "local" => Ok(BackendKind::File),
            "sqlite" => Ok(BackendKind::Sqlite),
            other => Err(StoreError::Config(format!(
                "unknown persistence backend {other:?} (expected \"file\" or \"sqlite\")"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub backend: BackendKind,
    pub path: PathBuf,
}

impl StorageConfig {
    pub fn new(backend: BackendKind, path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            path: path.into(),
        }
    }

    /// Resolve from optional overrides. `db_file` wins over `data_dir`; with
    /// neither, the per-user data dir is used. An unknown backend name is an
    /// error.
    pub fn resolve(
        backend: Option<&str>,
        db_file: Option<PathBuf>,
        data_dir: Option<PathBuf>,
    ) -> Result<Self, StoreError> {
        let backend = match backend {
            Some(name) if !name.trim().is_empty() => name.parse()?,
            _ => BackendKind::default(),
        };
        let path = match db_file {
            Some(path) => path,
            None => data_dir
                .unwrap_or_else(default_data_dir)
                .join(backend.default_file_name()),
        };
        Ok(Self { backend, path })
    }
}

/// Open the configured backend. Failure is returned, never papered over by
/// switching to another backend.
pub fn open_backend(config: &StorageConfig) -> Result<Arc<dyn PersistenceBackend>, StoreError> {
    let backend: Arc<dyn PersistenceBackend> = match config.backend {
        BackendKind::File => Arc::new(FileStore::open(&config.path)?),
        BackendKind::Sqlite => Arc::new(SqliteStore::open_or_create(&config.path)?),
    };
    tracing::info!(
        backend = %config.backend,
        path = %config.path.display(),
        "storage backend opened"
    );
    Ok(backend)
}
