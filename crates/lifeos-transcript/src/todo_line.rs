use lifeos_core::{defaults, TodoCandidate, TodoFields};
use thiserror::Error;

use crate::issue::ParseIssue;

/// Human-readable line format, used in issue suggestions.
pub const TODO_LINE_FORMAT: &str =
    "title|horizon|energy|context|money_cost|domain|responsible|due_date|notes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expected 9 fields (8 pipes), got {got}")]
pub struct FieldCountMismatch {
    pub got: usize,
}

/// Lowercase and trim; empty falls back to `fallback`.
pub fn normalize_enum(value: &str, fallback: &str) -> String {
    let v = value.trim().to_lowercase();
    if v.is_empty() {
        fallback.to_string()
    } else {
        v
    }
}

/// Decode one non-blank `|`-delimited line. Partial lines are rejected whole.
pub fn decode_todo_line(line: &str) -> Result<TodoCandidate, FieldCountMismatch> {
    let parts: Vec<&str> = line.split('|').map(str::trim).collect();
    let [title, horizon, energy, context, money_cost, domain, responsible, due_date, notes] =
        parts[..]
    else {
        return Err(FieldCountMismatch { got: parts.len() });
    };

    Ok(TodoCandidate {
        raw: line.to_string(),
        fields: TodoFields {
            title: title.to_string(),
            horizon: normalize_enum(horizon, defaults::HORIZON),
            energy: normalize_enum(energy, defaults::ENERGY),
            context: normalize_enum(context, defaults::CONTEXT),
            money_cost: normalize_enum(money_cost, defaults::MONEY_COST),
            domain: domain.to_string(),
            responsible: responsible.to_string(),
            due_date: due_date.to_string(),
            notes: notes.to_string(),
        },
    })
}

#[derive(Debug, Clone, Default)]
pub struct DecodeOutcome {
    pub todos: Vec<TodoCandidate>,
    pub issues: Vec<ParseIssue>,
}

/// Decode the TODOS section body. Blank lines are skipped silently; bad lines
/// become `TODO_FIELD_COUNT` issues numbered within the section body.
pub fn decode_todo_lines(lines: &[String]) -> DecodeOutcome {
    let mut out = DecodeOutcome::default();
    for (index, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match decode_todo_line(line) {
            Ok(todo) => out.todos.push(todo),
            Err(FieldCountMismatch { got }) => {
                out.issues.push(ParseIssue::todo_field_count(index + 1, got))
            }
        }
    }
    out
}
