use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::stamp::{parse_calendar_date, parse_timestamp};

/// Fallbacks for empty enumerated to-do fields.
pub mod defaults {
    pub const HORIZON: &str = "later";
    pub const ENERGY: &str = "low";
    pub const CONTEXT: &str = "online";
    pub const MONEY_COST: &str = "none";
}

/// Audit vocabulary.
pub mod audit {
    pub const COMMIT_DERIVED_FROM_TRANSCRIPT: &str = "commit_derived_from_transcript";
    pub const TARGET_TRANSCRIPT: &str = "transcript";
}

/// The nine structured fields of one to-do line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoFields {
    pub title: String,
    pub horizon: String,
    pub energy: String,
    pub context: String,
    pub money_cost: String,
    pub domain: String,
    pub responsible: String,
    pub due_date: String,
    pub notes: String,
}

impl TodoFields {
    /// Enumerated fields paired with their line-format names.
    pub fn enum_fields(&self) -> [(&'static str, &str); 4] {
        [
            ("horizon", &self.horizon),
            ("energy", &self.energy),
            ("context", &self.context),
            ("money_cost", &self.money_cost),
        ]
    }

    /// All nine fields in line order.
    pub fn all_fields(&self) -> [(&'static str, &str); 9] {
        [
            ("title", &self.title),
            ("horizon", &self.horizon),
            ("energy", &self.energy),
            ("context", &self.context),
            ("money_cost", &self.money_cost),
            ("domain", &self.domain),
            ("responsible", &self.responsible),
            ("due_date", &self.due_date),
            ("notes", &self.notes),
        ]
    }
}

/// A to-do extracted from the TODOS section, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoCandidate {
    /// The original line, untrimmed.
    pub raw: String,
    pub fields: TodoFields,
}

/// Outcome of a commit, also the value cached under its idempotency key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResult {
    pub idempotency_key: String,
    pub committed_todos: usize,
    /// Always 0 today; reserved for dedup inside a batch.
    pub skipped_todos: usize,
    pub audit_event_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRecord {
    pub id: String,
    pub workspace_id: String,
    pub raw_text: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoRecord {
    pub id: String,
    pub workspace_id: String,
    pub transcript_id: String,
    pub title: String,
    pub horizon: String,
    pub energy: String,
    pub context: String,
    pub money_cost: String,
    pub domain: String,
    pub responsible: String,
    pub due_date: String,
    pub notes: String,
    pub created_at: String,
}

impl TodoRecord {
    /// Copy a candidate's fields into a new record owned by `transcript_id`.
    pub fn from_candidate(
        id: String,
        workspace_id: &str,
        transcript_id: &str,
        candidate: &TodoCandidate,
        created_at: &str,
    ) -> Self {
        let f = &candidate.fields;
        Self {
            id,
            workspace_id: workspace_id.to_string(),
            transcript_id: transcript_id.to_string(),
            title: f.title.clone(),
            horizon: f.horizon.clone(),
            energy: f.energy.clone(),
            context: f.context.clone(),
            money_cost: f.money_cost.clone(),
            domain: f.domain.clone(),
            responsible: f.responsible.clone(),
            due_date: f.due_date.clone(),
            notes: f.notes.clone(),
            created_at: created_at.to_string(),
        }
    }

    /// Due instant in UTC. `YYYY-MM-DD` means midnight UTC of that day; an
    /// RFC 3339 timestamp is taken as is; anything else has no due date.
    pub fn due_at(&self) -> Option<OffsetDateTime> {
        let s = self.due_date.trim();
        parse_calendar_date(s)
            .map(|d| d.midnight().assume_utc())
            .or_else(|_| parse_timestamp(s))
            .ok()
    }

    /// Calendar day of [`Self::due_at`].
    pub fn due_on(&self) -> Option<Date> {
        self.due_at().map(|ts| ts.date())
    }

    pub fn created_at_utc(&self) -> Option<OffsetDateTime> {
        parse_timestamp(&self.created_at).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub id: String,
    pub workspace_id: String,
    pub action: String,
    pub target_type: String,
    pub target_id: String,
    pub metadata: serde_json::Value,
    pub created_at: String,
}

impl AuditEvent {
    /// The single audit record written for one successful commit.
    pub fn commit_derived(
        id: String,
        workspace_id: &str,
        transcript_id: &str,
        committed_todos: usize,
        idempotency_key: &str,
        created_at: &str,
    ) -> Self {
        Self {
            id,
            workspace_id: workspace_id.to_string(),
            action: audit::COMMIT_DERIVED_FROM_TRANSCRIPT.to_string(),
            target_type: audit::TARGET_TRANSCRIPT.to_string(),
            target_id: transcript_id.to_string(),
            metadata: serde_json::json!({
                "committedTodos": committed_todos,
                "idempotencyKey": idempotency_key,
            }),
            created_at: created_at.to_string(),
        }
    }
}

/// A transcript together with the to-dos committed from it (oldest first).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptDetail {
    pub transcript: TranscriptRecord,
    pub todos: Vec<TodoRecord>,
}
