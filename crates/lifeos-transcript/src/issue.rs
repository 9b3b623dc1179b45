use serde::{Deserialize, Serialize};

use crate::sections::SectionName;

/// Symbolic issue codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    UnknownSection,
    MissingRequiredSection,
    TodoFieldCount,
}

/// Where an issue applies: one section, or the whole document (`"GLOBAL"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum IssueScope {
    Global,
    Section(SectionName),
}

impl std::fmt::Display for IssueScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueScope::Global => f.write_str("GLOBAL"),
            IssueScope::Section(name) => f.write_str(name.as_str()),
        }
    }
}

impl From<IssueScope> for String {
    fn from(scope: IssueScope) -> Self {
        scope.to_string()
    }
}

impl TryFrom<String> for IssueScope {
    type Error = crate::sections::UnknownSection;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s == "GLOBAL" {
            Ok(IssueScope::Global)
        } else {
            s.parse().map(IssueScope::Section)
        }
    }
}

/// A structural problem found while parsing a draft.
///
/// `line` is 1-based; `0` marks a document-level issue such as a missing
/// section. Section-level issues count lines over the whole document, while
/// `TODO_FIELD_COUNT` counts lines within the TODOS section body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseIssue {
    pub line: usize,
    pub section: IssueScope,
    pub code: IssueCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub critical: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl ParseIssue {
    pub(crate) fn unknown_section(line: usize, name: &str) -> Self {
        Self {
            line,
            section: IssueScope::Global,
            code: IssueCode::UnknownSection,
            message: format!("Unknown section [{name}]"),
            suggestion: None,
            critical: false,
        }
    }

    pub(crate) fn missing_section(name: SectionName) -> Self {
        Self {
            line: 0,
            section: IssueScope::Section(name),
            code: IssueCode::MissingRequiredSection,
            message: format!("Missing required section [{name}]"),
            suggestion: Some(format!("Add [{name}] with content.")),
            critical: true,
        }
    }

    pub(crate) fn todo_field_count(line: usize, got: usize) -> Self {
        Self {
            line,
            section: IssueScope::Section(SectionName::Todos),
            code: IssueCode::TodoFieldCount,
            message: format!("Expected 9 fields (8 pipes), got {got}"),
            suggestion: Some(format!("Use: {}", crate::todo_line::TODO_LINE_FORMAT)),
            critical: false,
        }
    }
}
