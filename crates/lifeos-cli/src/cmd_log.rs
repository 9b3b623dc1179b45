use lifeos_core::{AuditEvent, TodoRecord, TranscriptRecord};

use crate::Ctx;

fn first_line(text: &str) -> &str {
    text.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim()
}

fn transcript_line(t: &TranscriptRecord) -> String {
    format!("{}  {}  {}", t.created_at, t.id, first_line(&t.raw_text))
}

pub(crate) fn todo_line(t: &TodoRecord) -> String {
    let due = if t.due_date.is_empty() { "-" } else { &t.due_date };
    format!(
        "{due:<10}  {} [{}/{}/{}/{}]{}",
        t.title,
        t.horizon,
        t.energy,
        t.context,
        t.money_cost,
        if t.responsible.is_empty() {
            String::new()
        } else {
            format!(" @{}", t.responsible)
        }
    )
}

fn audit_line(e: &AuditEvent) -> String {
    format!(
        "{}  {}  {} {}:{} ({} to-dos)",
        e.created_at,
        e.id,
        e.action,
        e.target_type,
        e.target_id,
        e.metadata["committedTodos"]
    )
}

pub fn transcripts(ctx: &Ctx, limit: usize, json: bool) -> anyhow::Result<()> {
    let rows = ctx.backend.list_transcripts(&ctx.workspace, limit)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("No transcripts yet.");
    }
    for t in &rows {
        println!("{}", transcript_line(t));
    }
    Ok(())
}

pub fn todos(ctx: &Ctx, limit: usize, json: bool) -> anyhow::Result<()> {
    let rows = ctx.backend.list_todos(&ctx.workspace, limit)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("No to-dos yet.");
    }
    for t in &rows {
        println!("{}", todo_line(t));
    }
    Ok(())
}

pub fn show(ctx: &Ctx, id: &str, json: bool) -> anyhow::Result<()> {
    let Some(detail) = ctx.backend.get_transcript_detail(&ctx.workspace, id)? else {
        anyhow::bail!("transcript {id} not found in workspace {}", ctx.workspace);
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }
    println!("{}", transcript_line(&detail.transcript));
    println!();
    println!("{}", detail.transcript.raw_text);
    println!();
    println!("To-dos ({}):", detail.todos.len());
    for t in &detail.todos {
        println!("  {}", todo_line(t));
    }
    Ok(())
}

pub fn audit(ctx: &Ctx, limit: usize, json: bool) -> anyhow::Result<()> {
    let rows = ctx.backend.list_audit_events(&ctx.workspace, limit)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    if rows.is_empty() {
        println!("No audit events.");
    }
    for e in &rows {
        println!("{}", audit_line(e));
    }
    Ok(())
}
