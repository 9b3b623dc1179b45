mod confidence;
mod issue;
mod parse;
mod sections;
mod todo_line;

pub use confidence::{score_issues, ConfidenceReport, CRITICAL_PENALTY, WARNING_PENALTY};
pub use issue::{IssueCode, IssueScope, ParseIssue};
pub use parse::{parse_draft, ParsedDraft};
pub use sections::{split_sections, SectionName, Sections, SplitOutcome, UnknownSection};
pub use todo_line::{
    decode_todo_line, decode_todo_lines, normalize_enum, DecodeOutcome, FieldCountMismatch,
    TODO_LINE_FORMAT,
};
