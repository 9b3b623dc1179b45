//! File-backed storage: one JSON document holding every collection.
//!
//! Mutations run under an exclusive lock on `<db>.lock` and persist with an
//! atomic rename, so readers see either the old or the new document and the
//! idempotency check-then-write is serialized across threads and processes.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use lifeos_core::stamp::{new_id, now_rfc3339};
use lifeos_core::{
    AuditEvent, CommitResult, TodoRecord, TranscriptDetail, TranscriptRecord,
};
use serde::{Deserialize, Serialize};

use crate::backend::{CommitTodosParams, PersistenceBackend};
use crate::config::BackendKind;
use crate::error::StoreError;
use crate::lock::{FileLock, LOCK_TIMEOUT};
use crate::paths::lock_path_for;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LocalDb {
    #[serde(default)]
    transcripts: Vec<TranscriptRecord>,
    #[serde(default)]
    todos: Vec<TodoRecord>,
    #[serde(default)]
    audit_events: Vec<AuditEvent>,
    #[serde(default)]
    idempotency: BTreeMap<String, CommitResult>,
}

pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl FileStore {
    /// Open (or lazily create) the document at `path`. An existing file that
    /// does not parse is an error; it is never reset.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self {
            lock_path: lock_path_for(&path),
            path,
            lock_timeout: LOCK_TIMEOUT,
        };
        store.load()?;
        Ok(store)
    }

    #[cfg(test)]
    fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<LocalDb, StoreError> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(LocalDb::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, db: &LocalDb) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(db)?;
        write_atomic(&self.path, &data)
    }

    /// Run `f` under the store lock; persist when it reports a change.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut LocalDb) -> Result<(T, bool), StoreError>,
    ) -> Result<T, StoreError> {
        let _lock = FileLock::acquire_within(&self.lock_path, self.lock_timeout)?;
        let mut db = self.load()?;
        let (out, changed) = f(&mut db)?;
        if changed {
            self.save(&db)?;
        }
        Ok(out)
    }
}

/// Atomic write: write to temp file in same dir, fsync, then rename.
fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

fn newest_first<T: Clone>(items: &[T], keep: impl Fn(&T) -> bool, limit: usize) -> Vec<T> {
    items
        .iter()
        .rev()
        .filter(|item| keep(item))
        .take(limit)
        .cloned()
        .collect()
}

impl PersistenceBackend for FileStore {
    fn kind(&self) -> BackendKind {
        BackendKind::File
    }

    fn create_transcript(
        &self,
        workspace_id: &str,
        raw_text: &str,
    ) -> Result<TranscriptRecord, StoreError> {
        let record = TranscriptRecord {
            id: new_id("tr"),
            workspace_id: workspace_id.to_string(),
            raw_text: raw_text.to_string(),
            created_at: now_rfc3339(),
        };
        self.mutate(|db| {
            db.transcripts.push(record.clone());
            Ok(((), true))
        })?;
        Ok(record)
    }

    fn get_idempotency_result(&self, key: &str) -> Result<Option<CommitResult>, StoreError> {
        Ok(self.load()?.idempotency.get(key).cloned())
    }

    fn commit_todos_and_audit(
        &self,
        params: &CommitTodosParams<'_>,
    ) -> Result<CommitResult, StoreError> {
        self.mutate(|db| {
            if let Some(existing) = db.idempotency.get(params.idempotency_key) {
                tracing::debug!(key = params.idempotency_key, "idempotency key already committed");
                return Ok((existing.clone(), false));
            }

            let created_at = now_rfc3339();
            let records: Vec<TodoRecord> = params
                .todos
                .iter()
                .map(|todo| {
                    TodoRecord::from_candidate(
                        new_id("todo"),
                        params.workspace_id,
                        params.transcript_id,
                        todo,
                        &created_at,
                    )
                })
                .collect();
            let audit = AuditEvent::commit_derived(
                new_id("aud"),
                params.workspace_id,
                params.transcript_id,
                records.len(),
                params.idempotency_key,
                &created_at,
            );
            let result = CommitResult {
                idempotency_key: params.idempotency_key.to_string(),
                committed_todos: records.len(),
                skipped_todos: 0,
                audit_event_id: audit.id.clone(),
            };

            db.todos.extend(records);
            db.audit_events.push(audit);
            db.idempotency
                .insert(params.idempotency_key.to_string(), result.clone());
            Ok((result, true))
        })
    }

    fn list_transcripts(
        &self,
        workspace_id: &str,
        limit: usize,
    ) -> Result<Vec<TranscriptRecord>, StoreError> {
        let db = self.load()?;
        Ok(newest_first(&db.transcripts, |t| t.workspace_id == workspace_id, limit))
    }

    fn list_todos(&self, workspace_id: &str, limit: usize) -> Result<Vec<TodoRecord>, StoreError> {
        let db = self.load()?;
        Ok(newest_first(&db.todos, |t| t.workspace_id == workspace_id, limit))
    }

    fn get_transcript_detail(
        &self,
        workspace_id: &str,
        transcript_id: &str,
    ) -> Result<Option<TranscriptDetail>, StoreError> {
        let db = self.load()?;
        let Some(transcript) = db
            .transcripts
            .iter()
            .find(|t| t.workspace_id == workspace_id && t.id == transcript_id)
            .cloned()
        else {
            return Ok(None);
        };
        let todos = db
            .todos
            .iter()
            .filter(|t| t.workspace_id == workspace_id && t.transcript_id == transcript_id)
            .cloned()
            .collect();
        Ok(Some(TranscriptDetail { transcript, todos }))
    }

    fn list_audit_events(
        &self,
        workspace_id: &str,
        limit: usize,
    ) -> Result<Vec<AuditEvent>, StoreError> {
        let db = self.load()?;
        Ok(newest_first(&db.audit_events, |e| e.workspace_id == workspace_id, limit))
    }
}
