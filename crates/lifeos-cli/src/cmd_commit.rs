use std::path::Path;

use anyhow::Context;
use lifeos_core::{CommitResult, TranscriptRecord};
use lifeos_ledger::{commit_derived_from_transcript, CommitRequest};
use lifeos_transcript::parse_draft;
use serde::Serialize;

use crate::cmd_draft::{ensure_committable, read_input};
use crate::Ctx;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOutcome {
    pub transcript: TranscriptRecord,
    pub commit: CommitResult,
}

pub fn create(ctx: &Ctx, file: &Path, json: bool) -> anyhow::Result<()> {
    let text = read_input(file)?;
    let transcript = ctx.backend.create_transcript(&ctx.workspace, &text)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&transcript)?);
    } else {
        println!("Created transcript {}", transcript.id);
    }
    Ok(())
}

/// Parse `text`, refuse when blocked, and commit its to-dos under `transcript_id`.
pub fn commit_text(
    ctx: &Ctx,
    transcript_id: &str,
    text: &str,
    key: Option<String>,
) -> anyhow::Result<CommitResult> {
    let parsed = parse_draft(text);
    ensure_committable(&parsed)?;
    let req = CommitRequest {
        workspace_id: ctx.workspace.clone(),
        transcript_id: transcript_id.to_string(),
        todos: parsed.todos,
        idempotency_key: key,
    };
    commit_derived_from_transcript(ctx.backend.as_ref(), &req)
        .with_context(|| format!("committing to-dos of {transcript_id}"))
}

pub fn commit(
    ctx: &Ctx,
    transcript_id: &str,
    file: &Path,
    key: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let text = read_input(file)?;
    let result = commit_text(ctx, transcript_id, &text, key)?;
    print_commit(&result, json)
}

/// Store `text` as a transcript, then commit its to-dos unless blocked. The
/// transcript is kept even when the commit is refused.
pub fn ingest_text(ctx: &Ctx, text: &str, key: Option<String>) -> anyhow::Result<IngestOutcome> {
    let transcript = ctx.backend.create_transcript(&ctx.workspace, text)?;
    tracing::debug!(id = %transcript.id, "transcript stored");
    let commit = commit_text(ctx, &transcript.id, text, key)?;
    Ok(IngestOutcome { transcript, commit })
}

pub fn ingest(ctx: &Ctx, file: &Path, key: Option<String>, json: bool) -> anyhow::Result<()> {
    let text = read_input(file)?;
    let outcome = ingest_text(ctx, &text, key)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }
    println!("Transcript {}", outcome.transcript.id);
    print_commit(&outcome.commit, false)
}

fn print_commit(result: &CommitResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        println!(
            "Committed {} to-do(s), audit {} (key {})",
            result.committed_todos, result.audit_event_id, result.idempotency_key
        );
    }
    Ok(())
}
