//! SQLite-backed storage.
//!
//! One database file in WAL mode. The idempotency key is the primary key of
//! `idempotency_keys`, and every commit runs inside an IMMEDIATE transaction
//! so the check-then-write is serialized against other connections.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use lifeos_core::stamp::{new_id, now_rfc3339};
use lifeos_core::{AuditEvent, CommitResult, TodoRecord, TranscriptDetail, TranscriptRecord};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::backend::{CommitTodosParams, PersistenceBackend};
use crate::config::BackendKind;
use crate::error::StoreError;

const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS transcripts (
    rowid INTEGER PRIMARY KEY,
    id TEXT UNIQUE NOT NULL,
    workspace_id TEXT NOT NULL,
    raw_text TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_transcripts_ws ON transcripts(workspace_id);

CREATE TABLE IF NOT EXISTS todos (
    rowid INTEGER PRIMARY KEY,
    id TEXT UNIQUE NOT NULL,
    workspace_id TEXT NOT NULL,
    transcript_id TEXT NOT NULL,
    title TEXT NOT NULL,
    horizon TEXT NOT NULL,
    energy TEXT NOT NULL,
    context TEXT NOT NULL,
    money_cost TEXT NOT NULL,
    domain TEXT NOT NULL,
    responsible TEXT NOT NULL,
    due_date TEXT NOT NULL,
    notes TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_todos_ws ON todos(workspace_id);
CREATE INDEX IF NOT EXISTS idx_todos_transcript ON todos(workspace_id, transcript_id);

CREATE TABLE IF NOT EXISTS audit_events (
    rowid INTEGER PRIMARY KEY,
    id TEXT UNIQUE NOT NULL,
    workspace_id TEXT NOT NULL,
    action TEXT NOT NULL,
    target_type TEXT NOT NULL,
    target_id TEXT NOT NULL,
    metadata TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_audit_ws ON audit_events(workspace_id);

CREATE TABLE IF NOT EXISTS idempotency_keys (
    key TEXT PRIMARY KEY,
    workspace_id TEXT NOT NULL,
    result_payload TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

const TODO_COLUMNS: &str = "id, workspace_id, transcript_id, title, horizon, energy, context, \
     money_cost, domain, responsible, due_date, notes, created_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database with the full schema.
    pub fn open_or_create(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        apply_pragmas(&conn)?;
        apply_schema(&conn)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        let found = store.schema_version()?;
        if found > SCHEMA_VERSION {
            return Err(StoreError::Config(format!(
                "{} has schema version {found}, newer than supported {SCHEMA_VERSION}",
                db_path.display()
            )));
        }
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn schema_version(&self) -> Result<u32, StoreError> {
        let conn = self.conn()?;
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM schema_meta WHERE key = 'version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.and_then(|v| v.parse().ok()).unwrap_or(0))
    }
}

fn apply_pragmas(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA busy_timeout = 5000;",
    )?;
    Ok(())
}

fn apply_schema(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('version', ?1)",
        params![SCHEMA_VERSION.to_string()],
    )?;
    Ok(())
}

fn lookup_result(conn: &Connection, key: &str) -> Result<Option<CommitResult>, StoreError> {
    let payload: Option<String> = conn
        .query_row(
            "SELECT result_payload FROM idempotency_keys WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    match payload {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

fn map_transcript(row: &rusqlite::Row<'_>) -> rusqlite::Result<TranscriptRecord> {
    Ok(TranscriptRecord {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        raw_text: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn map_todo(row: &rusqlite::Row<'_>) -> rusqlite::Result<TodoRecord> {
    Ok(TodoRecord {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        transcript_id: row.get(2)?,
        title: row.get(3)?,
        horizon: row.get(4)?,
        energy: row.get(5)?,
        context: row.get(6)?,
        money_cost: row.get(7)?,
        domain: row.get(8)?,
        responsible: row.get(9)?,
        due_date: row.get(10)?,
        notes: row.get(11)?,
        created_at: row.get(12)?,
    })
}

impl PersistenceBackend for SqliteStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Sqlite
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
        self.conn()?.execute(
            "INSERT INTO transcripts (id, workspace_id, raw_text, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.id,
                record.workspace_id,
                record.raw_text,
                record.created_at
            ],
        )?;
        Ok(record)
    }

    fn get_idempotency_result(&self, key: &str) -> Result<Option<CommitResult>, StoreError> {
        let conn = self.conn()?;
        lookup_result(&conn, key)
    }

    fn commit_todos_and_audit(
        &self,
        params: &CommitTodosParams<'_>,
    ) -> Result<CommitResult, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(existing) = lookup_result(&tx, params.idempotency_key)? {
            tracing::debug!(key = params.idempotency_key, "idempotency key already committed");
            return Ok(existing);
        }

        let created_at = now_rfc3339();
        for todo in params.todos {
            let rec = TodoRecord::from_candidate(
                new_id("todo"),
                params.workspace_id,
                params.transcript_id,
                todo,
                &created_at,
            );
            tx.execute(
                &format!(
                    "INSERT INTO todos ({TODO_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
                ),
                params![
                    rec.id,
                    rec.workspace_id,
                    rec.transcript_id,
                    rec.title,
                    rec.horizon,
                    rec.energy,
                    rec.context,
                    rec.money_cost,
                    rec.domain,
                    rec.responsible,
                    rec.due_date,
                    rec.notes,
                    rec.created_at,
                ],
            )?;
        }

        let audit = AuditEvent::commit_derived(
            new_id("aud"),
            params.workspace_id,
            params.transcript_id,
            params.todos.len(),
            params.idempotency_key,
            &created_at,
        );
        tx.execute(
            "INSERT INTO audit_events
             (id, workspace_id, action, target_type, target_id, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                audit.id,
                audit.workspace_id,
                audit.action,
                audit.target_type,
                audit.target_id,
                serde_json::to_string(&audit.metadata)?,
                audit.created_at,
            ],
        )?;

        let result = CommitResult {
            idempotency_key: params.idempotency_key.to_string(),
            committed_todos: params.todos.len(),
            skipped_todos: 0,
            audit_event_id: audit.id,
        };
        tx.execute(
            "INSERT INTO idempotency_keys (key, workspace_id, result_payload, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                params.idempotency_key,
                params.workspace_id,
                serde_json::to_string(&result)?,
                created_at,
            ],
        )?;

        tx.commit()?;
        Ok(result)
    }

    fn list_transcripts(
        &self,
        workspace_id: &str,
        limit: usize,
    ) -> Result<Vec<TranscriptRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, workspace_id, raw_text, created_at FROM transcripts
             WHERE workspace_id = ?1 ORDER BY rowid DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![workspace_id, limit as i64], map_transcript)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn list_todos(&self, workspace_id: &str, limit: usize) -> Result<Vec<TodoRecord>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {TODO_COLUMNS} FROM todos
             WHERE workspace_id = ?1 ORDER BY rowid DESC LIMIT ?2"
        ))?;
        let rows = stmt
            .query_map(params![workspace_id, limit as i64], map_todo)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn get_transcript_detail(
        &self,
        workspace_id: &str,
        transcript_id: &str,
    ) -> Result<Option<TranscriptDetail>, StoreError> {
        let conn = self.conn()?;
        let transcript = conn
            .query_row(
                "SELECT id, workspace_id, raw_text, created_at FROM transcripts
                 WHERE workspace_id = ?1 AND id = ?2",
                params![workspace_id, transcript_id],
                map_transcript,
            )
            .optional()?;
        let Some(transcript) = transcript else {
            return Ok(None);
        };
        let mut stmt = conn.prepare(&format!(
            "SELECT {TODO_COLUMNS} FROM todos
             WHERE workspace_id = ?1 AND transcript_id = ?2 ORDER BY rowid ASC"
        ))?;
        let todos = stmt
            .query_map(params![workspace_id, transcript_id], map_todo)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(TranscriptDetail { transcript, todos }))
    }

    fn list_audit_events(
        &self,
        workspace_id: &str,
        limit: usize,
    ) -> Result<Vec<AuditEvent>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, workspace_id, action, target_type, target_id, metadata, created_at
             FROM audit_events WHERE workspace_id = ?1 ORDER BY rowid DESC LIMIT ?2",
        )?;
        let rows: Vec<(String, String, String, String, String, String, String)> = stmt
            .query_map(params![workspace_id, limit as i64], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(
                |(id, workspace_id, action, target_type, target_id, metadata, created_at)| {
                    Ok(AuditEvent {
                        id,
                        workspace_id,
                        action,
                        target_type,
                        target_id,
                        metadata: serde_json::from_str(&metadata)?,
                        created_at,
                    })
                },
            )
            .collect()
    }
}

impl Drop for SqliteStore {
    fn drop(&mut self) {
        // Merge WAL back into main DB so users see a single file when idle.
        if let Ok(conn) = self.conn.get_mut() {
            let _ = conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);");
        }
    }
}
