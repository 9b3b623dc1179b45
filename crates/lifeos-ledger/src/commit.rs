//! Idempotent commit of parsed to-dos.
//!
//! The orchestrator validates its input, resolves the idempotency key and
//! short-circuits on a known key. The race between two first-time commits of
//! one key is settled by the backend's atomic `commit_todos_and_audit`.

use lifeos_core::hash::canonical_digest;
use lifeos_core::{CommitResult, TodoCandidate};
use serde::{Deserialize, Serialize};

use crate::backend::{CommitTodosParams, PersistenceBackend};
use crate::error::CommitError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    pub workspace_id: String,
    pub transcript_id: String,
    pub todos: Vec<TodoCandidate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyMaterial<'a> {
    workspace_id: &'a str,
    transcript_id: &'a str,
    todos: &'a [TodoCandidate],
}

/// Content-derived key: SHA-256 hex of the canonical JSON of
/// `{transcriptId, todos, workspaceId}`.
pub fn derive_idempotency_key(
    workspace_id: &str,
    transcript_id: &str,
    todos: &[TodoCandidate],
) -> Result<String, serde_json::Error> {
    canonical_digest(&KeyMaterial {
        workspace_id,
        transcript_id,
        todos,
    })
}

/// Reject candidates that did not come out of the line decoder intact.
pub fn validate_candidates(todos: &[TodoCandidate]) -> Result<(), CommitError> {
    for (index, todo) in todos.iter().enumerate() {
        let malformed = |reason: String| CommitError::MalformedCandidate { index, reason };

        for (name, value) in todo.fields.enum_fields() {
            if value.is_empty() {
                return Err(malformed(format!("{name} is empty")));
            }
            if value != value.trim().to_lowercase() {
                return Err(malformed(format!("{name} {value:?} is not normalized")));
            }
        }
        for (name, value) in todo.fields.all_fields() {
            if value != value.trim() {
                return Err(malformed(format!("{name} has surrounding whitespace")));
            }
            if value.contains(['|', '\r', '\n']) {
                return Err(malformed(format!(
                    "{name} contains a field or line separator"
                )));
            }
        }
    }
    Ok(())
}

fn require(value: &str, name: &'static str) -> Result<(), CommitError> {
    if value.trim().is_empty() {
        return Err(CommitError::MissingIdentifier(name));
    }
    Ok(())
}

/// Commit `req.todos` exactly once per idempotency key.
///
/// A known key returns the stored result unchanged, even when the payload
/// differs from the first commit.
pub fn commit_derived_from_transcript(
    backend: &dyn PersistenceBackend,
    req: &CommitRequest,
) -> Result<CommitResult, CommitError> {
    require(&req.workspace_id, "workspaceId")?;
    require(&req.transcript_id, "transcriptId")?;
    validate_candidates(&req.todos)?;

    let key = match req.idempotency_key.as_deref() {
        Some(key) if key.trim().is_empty() => return Err(CommitError::EmptyIdempotencyKey),
        Some(key) => key.to_string(),
        None => derive_idempotency_key(&req.workspace_id, &req.transcript_id, &req.todos)
            .map_err(CommitError::KeyDerivation)?,
    };

    if let Some(existing) = backend.get_idempotency_result(&key)? {
        tracing::debug!(key = %key, "replaying committed result");
        return Ok(existing);
    }

    let result = backend.commit_todos_and_audit(&CommitTodosParams {
        workspace_id: &req.workspace_id,
        transcript_id: &req.transcript_id,
        todos: &req.todos,
        idempotency_key: &key,
    })?;
    tracing::info!(
        workspace = %req.workspace_id,
        transcript = %req.transcript_id,
        committed = result.committed_todos,
        audit_event = %result.audit_event_id,
        "committed derived todos"
    );
    Ok(result)
}
