use lifeos_core::TodoCandidate;
use serde::{Deserialize, Serialize};

use crate::confidence::{collect_issues, score_issues, ConfidenceReport};
use crate::issue::ParseIssue;
use crate::sections::{split_sections, Sections};
use crate::todo_line::decode_todo_lines;

/// Everything extracted from one draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedDraft {
    pub sections: Sections,
    pub todos: Vec<TodoCandidate>,
    pub issues: Vec<ParseIssue>,
    pub confidence: ConfidenceReport,
}

impl ParsedDraft {
    /// Committing derived to-dos is refused while this is true.
    pub fn is_blocked(&self) -> bool {
        self.confidence.global_critical
    }

    pub fn critical_issues(&self) -> impl Iterator<Item = &ParseIssue> {
        self.issues.iter().filter(|i| i.critical)
    }
}

/// Parse raw draft text. Never fails: structural problems come back as issues.
///
/// Issue order: unknown-section headers (document order), missing sections
/// (section order), then malformed TODOS lines (line order).
pub fn parse_draft(text: &str) -> ParsedDraft {
    let split = split_sections(text);
    let decoded = decode_todo_lines(&split.sections.todos);
    let issues = collect_issues([split.issues, decoded.issues]);
    let confidence = score_issues(&issues);

    ParsedDraft {
        sections: split.sections,
        todos: decoded.todos,
        issues,
        confidence,
    }
}
