use crate::error::StoreError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

/// Longest a writer waits for the lock; matches the SQLite `busy_timeout`.
pub const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const RETRY_MIN: Duration = Duration::from_millis(2);
const RETRY_MAX: Duration = Duration::from_millis(50);

/// Exclusive advisory lock on a sidecar file, released when dropped.
///
/// Every open takes its own file description, so two threads of one process
/// exclude each other the same way two processes do.
pub struct FileLock {
    _file: File,
}

impl FileLock {
    /// Poll for the lock with backoff; fail with `StoreError::Lock` once
    /// `timeout` has passed.
    pub fn acquire_within(path: &Path, timeout: Duration) -> Result<Self, StoreError> {
        let file = Self::open(path)?;
        let deadline = Instant::now() + timeout;
        let mut pause = RETRY_MIN;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => return Ok(Self { _file: file }),
                Err(e) if e.kind() != fs2::lock_contended_error().kind() => {
                    return Err(StoreError::Lock {
                        path: path.to_path_buf(),
                        source: e,
                    });
                }
                Err(_) => {}
            }
            let now = Instant::now();
            if now >= deadline {
                tracing::warn!(path = %path.display(), ?timeout, "store lock wait timed out");
                return Err(StoreError::Lock {
                    path: path.to_path_buf(),
                    source: io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("still held after {timeout:?}"),
                    ),
                });
            }
            thread::sleep(pause.min(deadline - now));
            pause = (pause * 2).min(RETRY_MAX);
        }
    }

    fn open(path: &Path) -> Result<File, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|source| StoreError::Lock {
                path: path.to_path_buf(),
                source,
            })
    }
}
