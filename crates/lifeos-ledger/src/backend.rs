use lifeos_core::{
    AuditEvent, CommitResult, TodoCandidate, TodoRecord, TranscriptDetail, TranscriptRecord,
};

use crate::config::BackendKind;
use crate::error::StoreError;

/// Input of [`PersistenceBackend::commit_todos_and_audit`]. The key is always
/// resolved by the caller.
#[derive(Debug, Clone, Copy)]
pub struct CommitTodosParams<'a> {
    pub workspace_id: &'a str,
    pub transcript_id: &'a str,
    pub todos: &'a [TodoCandidate],
    pub idempotency_key: &'a str,
}

/// Durable keyed storage for transcripts, to-dos, audit events and the
/// idempotency cache.
///
/// `commit_todos_and_audit` must be atomic per key: when the key is already
/// registered it returns the stored result and writes nothing; otherwise the
/// to-do records, one audit event and the key become visible together. Two
/// concurrent calls with one key never both write.
pub trait PersistenceBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn create_transcript(
        &self,
        workspace_id: &str,
        raw_text: &str,
    ) -> Result<TranscriptRecord, StoreError>;

    fn get_idempotency_result(&self, key: &str) -> Result<Option<CommitResult>, StoreError>;

    fn commit_todos_and_audit(
        &self,
        params: &CommitTodosParams<'_>,
    ) -> Result<CommitResult, StoreError>;

    /// Newest first.
    fn list_transcripts(
        &self,
        workspace_id: &str,
        limit: usize,
    ) -> Result<Vec<TranscriptRecord>, StoreError>;

    /// Newest first.
    fn list_todos(&self, workspace_id: &str, limit: usize) -> Result<Vec<TodoRecord>, StoreError>;

    /// The transcript plus its to-dos, oldest first. `None` when the transcript
    /// does not exist in this workspace.
    fn get_transcript_detail(
        &self,
        workspace_id: &str,
        transcript_id: &str,
    ) -> Result<Option<TranscriptDetail>, StoreError>;

    /// Newest first.
    fn list_audit_events(
        &self,
        workspace_id: &str,
        limit: usize,
    ) -> Result<Vec<AuditEvent>, StoreError>;
}
