use lifeos_serve::planning::{due_between, monday_of, parse_week_start, OperationalSummary};
use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::cmd_log::todo_line;
use crate::Ctx;

pub fn week(ctx: &Ctx, start: Option<&str>, limit: usize, json: bool) -> anyhow::Result<()> {
    if !(1..=1000).contains(&limit) {
        anyhow::bail!("--limit must be between 1 and 1000");
    }
    let start = match start {
        Some(s) => parse_week_start(s).map_err(anyhow::Error::msg)?,
        None => monday_of(OffsetDateTime::now_utc().date()),
    };
    let end = start
        .checked_add(Duration::days(7))
        .ok_or_else(|| anyhow::anyhow!("week start {start} is out of range"))?;
    let todos = due_between(ctx.backend.list_todos(&ctx.workspace, limit)?, start, end);

    if json {
        let out = json!({
            "workspaceId": ctx.workspace,
            "weekStart": start.to_string(),
            "weekEndExclusive": end.to_string(),
            "todos": todos,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }
    println!("Week of {start} ({} to-dos)", todos.len());
    for t in &todos {
        println!("  {}", todo_line(t));
    }
    Ok(())
}

pub fn summary(ctx: &Ctx, json: bool) -> anyhow::Result<()> {
    let transcripts = ctx.backend.list_transcripts(&ctx.workspace, 200)?;
    let todos = ctx.backend.list_todos(&ctx.workspace, 500)?;
    let s = OperationalSummary::compute(
        &ctx.workspace,
        transcripts.len(),
        &todos,
        OffsetDateTime::now_utc(),
    );
    if json {
        println!("{}", serde_json::to_string_pretty(&s)?);
    } else {
        println!("Workspace:             {}", s.workspace_id);
        println!("Open to-dos:           {}", s.open_todos);
        println!("Transcripts processed: {}", s.transcripts_processed);
        println!("Due this week:         {}", s.due_this_week);
        println!("Created last 7 days:   {}", s.created_last7d);
    }
    Ok(())
}
