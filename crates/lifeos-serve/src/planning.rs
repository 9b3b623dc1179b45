//! Weekly plan and operational summary views over stored to-dos.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use lifeos_core::stamp::parse_calendar_date;
use lifeos_core::TodoRecord;
use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime, Weekday};

use crate::context::Workspace;
use crate::error::AppError;
use crate::AppState;

const WEEKLY_LIMIT_DEFAULT: usize = 500;
const WEEKLY_LIMIT_MAX: usize = 1000;
const SUMMARY_TODO_WINDOW: usize = 500;
const SUMMARY_TRANSCRIPT_WINDOW: usize = 200;

/// Monday of the week containing `date`.
pub fn monday_of(date: Date) -> Date {
    date - Duration::days(i64::from(date.weekday().number_days_from_monday()))
}

/// Accept only a real `YYYY-MM-DD` that falls on a Monday.
pub fn parse_week_start(s: &str) -> Result<Date, String> {
    let date = parse_calendar_date(s)
        .map_err(|_| "weekStart must be a valid ISO date (YYYY-MM-DD)".to_string())?;
    if date.weekday() != Weekday::Monday {
        return Err("weekStart must be a Monday".to_string());
    }
    Ok(date)
}

/// To-dos due in `[start, end)`, in input order.
pub fn due_between(todos: Vec<TodoRecord>, start: Date, end: Date) -> Vec<TodoRecord> {
    let from = start.midnight().assume_utc();
    let until = end.midnight().assume_utc();
    todos
        .into_iter()
        .filter(|t| t.due_at().is_some_and(|due| due >= from && due < until))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalSummary {
    pub workspace_id: String,
    pub open_todos: usize,
    pub transcripts_processed: usize,
    pub due_this_week: usize,
    pub created_last7d: usize,
}

impl OperationalSummary {
    pub fn compute(
        workspace_id: &str,
        transcripts: usize,
        todos: &[TodoRecord],
        now: OffsetDateTime,
    ) -> Self {
        let week = Duration::days(7);
        let due_this_week = todos
            .iter()
            .filter(|t| t.due_at().is_some_and(|due| due >= now && due <= now + week))
            .count();
        let created_last7d = todos
            .iter()
            .filter(|t| t.created_at_utc().is_some_and(|c| c >= now - week))
            .count();
        Self {
            workspace_id: workspace_id.to_string(),
            open_todos: todos.len(),
            transcripts_processed: transcripts,
            due_this_week,
            created_last7d,
        }
    }
}

// ── GET /api/weekly-plan ──

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WeeklyQuery {
    week_start: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WeeklyPlanResponse {
    workspace_id: String,
    week_start: String,
    week_end_exclusive: String,
    todos: Vec<TodoRecord>,
}

pub(crate) async fn get_weekly_plan(
    State(state): State<Arc<AppState>>,
    Workspace(workspace_id): Workspace,
    query: Result<Query<WeeklyQuery>, QueryRejection>,
) -> Result<Json<WeeklyPlanResponse>, AppError> {
    let Query(q) = query?;
    let limit = q.limit.unwrap_or(WEEKLY_LIMIT_DEFAULT);
    if !(1..=WEEKLY_LIMIT_MAX).contains(&limit) {
        return Err(AppError::bad_request(format!(
            "limit must be between 1 and {WEEKLY_LIMIT_MAX}"
        )));
    }

    let start = match q.week_start.as_deref() {
        Some(s) => parse_week_start(s).map_err(AppError::BadRequest)?,
        None => monday_of(OffsetDateTime::now_utc().date()),
    };
    let end = start
        .checked_add(Duration::days(7))
        .ok_or_else(|| AppError::bad_request("weekStart is out of range"))?;

    let todos = state.backend.list_todos(&workspace_id, limit)?;
    Ok(Json(WeeklyPlanResponse {
        workspace_id,
        week_start: start.to_string(),
        week_end_exclusive: end.to_string(),
        todos: due_between(todos, start, end),
    }))
}

// ── GET /api/operational/summary ──

pub(crate) async fn get_summary(
    State(state): State<Arc<AppState>>,
    Workspace(workspace_id): Workspace,
) -> Result<Json<OperationalSummary>, AppError> {
    let transcripts = state
        .backend
        .list_transcripts(&workspace_id, SUMMARY_TRANSCRIPT_WINDOW)?;
    let todos = state.backend.list_todos(&workspace_id, SUMMARY_TODO_WINDOW)?;
    Ok(Json(OperationalSummary::compute(
        &workspace_id,
        transcripts.len(),
        &todos,
        OffsetDateTime::now_utc(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn todo(due: &str, created: &str) -> TodoRecord {
        TodoRecord {
            id: format!("todo_{due}"),
            workspace_id: "ws".into(),
            transcript_id: "tr_1".into(),
            title: "t".into(),
            horizon: "now".into(),
            energy: "low".into(),
            context: "home".into(),
            money_cost: "none".into(),
            domain: String::new(),
            responsible: String::new(),
            due_date: due.into(),
            notes: String::new(),
            created_at: created.into(),
        }
    }

    #[test]
    fn monday_of_rolls_back() {
        assert_eq!(monday_of(date!(2026 - 02 - 09)), date!(2026 - 02 - 09));
        assert_eq!(monday_of(date!(2026 - 02 - 15)), date!(2026 - 02 - 09));
        assert_eq!(monday_of(date!(2026 - 02 - 11)), date!(2026 - 02 - 09));
    }

    #[test]
    fn week_start_must_be_monday() {
        assert_eq!(parse_week_start("2026-02-09").unwrap(), date!(2026 - 02 - 09));
        assert!(parse_week_start("2026-02-10").unwrap_err().contains("Monday"));
        assert!(parse_week_start("2026-02-30").unwrap_err().contains("YYYY-MM-DD"));
    }

    #[test]
    fn due_between_is_half_open() {
        let todos = vec![
            todo("2026-02-08", ""),
            todo("2026-02-09", ""),
            todo("2026-02-15T23:59:00Z", ""),
            todo("2026-02-16", ""),
            todo("someday", ""),
        ];
        let week = due_between(todos, date!(2026 - 02 - 09), date!(2026 - 02 - 16));
        let dues: Vec<&str> = week.iter().map(|t| t.due_date.as_str()).collect();
        assert_eq!(dues, ["2026-02-09", "2026-02-15T23:59:00Z"]);
    }

    #[test]
    fn summary_counts_windows() {
        let now = datetime!(2026-02-10 12:00 UTC);
        let todos = vec![
            todo("2026-02-12", "2026-02-09T08:00:00Z"),
            todo("2026-02-20", "2026-01-01T00:00:00Z"),
            todo("2026-02-10", "2026-02-10T11:00:00Z"),
            todo("", "not a timestamp"),
        ];
        let s = OperationalSummary::compute("ws", 3, &todos, now);
        assert_eq!(s.open_todos, 4);
        assert_eq!(s.transcripts_processed, 3);
        // midnight on the 10th is already past at noon
        assert_eq!(s.due_this_week, 1);
        assert_eq!(s.created_last7d, 2);
    }
}
