use std::io::Read;
use std::path::Path;

use anyhow::Context;
use lifeos_transcript::{parse_draft, ParseIssue, ParsedDraft};

/// Read a draft from `path`, or stdin when `path` is `-`.
pub fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading draft from stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading draft {}", path.display()))
}

pub fn parse(file: &Path, json: bool) -> anyhow::Result<()> {
    let text = read_input(file)?;
    let parsed = parse_draft(&text);
    if json {
        println!("{}", serde_json::to_string_pretty(&parsed)?);
    } else {
        print_report(&parsed);
    }
    Ok(())
}

fn issue_line(issue: &ParseIssue) -> String {
    let marker = if issue.critical { "!" } else { "-" };
    let mut line = format!(
        "  {marker} [{}:{}] {}",
        issue.section, issue.line, issue.message
    );
    if let Some(hint) = &issue.suggestion {
        line.push_str(&format!(" ({hint})"));
    }
    line
}

pub fn print_report(parsed: &ParsedDraft) {
    println!(
        "Confidence: {}{}",
        parsed.confidence.score,
        if parsed.is_blocked() { " (blocked)" } else { "" }
    );
    println!("To-dos: {}", parsed.todos.len());
    for todo in &parsed.todos {
        let f = &todo.fields;
        let due = if f.due_date.is_empty() { "-" } else { &f.due_date };
        println!("  {} [{}/{}/{}] due {due}", f.title, f.horizon, f.energy, f.context);
    }
    if !parsed.issues.is_empty() {
        println!("Issues: {}", parsed.issues.len());
        for issue in &parsed.issues {
            println!("{}", issue_line(issue));
        }
    }
}

/// Refuse drafts with critical issues; the critical ones go to stderr.
pub fn ensure_committable(parsed: &ParsedDraft) -> anyhow::Result<()> {
    if !parsed.is_blocked() {
        return Ok(());
    }
    for issue in parsed.critical_issues() {
        eprintln!("{}", issue_line(issue));
    }
    anyhow::bail!(
        "draft has {} critical issue(s); fix them before committing",
        parsed.critical_issues().count()
    )
}
