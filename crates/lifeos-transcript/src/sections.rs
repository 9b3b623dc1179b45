use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::issue::ParseIssue;

/// The seven required sections, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionName {
    Summary,
    Timeline,
    Todos,
    Decisions,
    Money,
    Ideas,
    Questions,
}

impl SectionName {
    pub const ALL: [SectionName; 7] = [
        SectionName::Summary,
        SectionName::Timeline,
        SectionName::Todos,
        SectionName::Decisions,
        SectionName::Money,
        SectionName::Ideas,
        SectionName::Questions,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionName::Summary => "SUMMARY",
            SectionName::Timeline => "TIMELINE",
            SectionName::Todos => "TODOS",
            SectionName::Decisions => "DECISIONS",
            SectionName::Money => "MONEY",
            SectionName::Ideas => "IDEAS",
            SectionName::Questions => "QUESTIONS",
        }
    }
}

impl std::fmt::Display for SectionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown section [{0}]")]
pub struct UnknownSection(pub String);

impl std::str::FromStr for SectionName {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownSection(s.to_string()))
    }
}

/// Body lines of every required section. Each key is always present, so a
/// serialized draft carries all seven even when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sections {
    #[serde(rename = "SUMMARY")]
    pub summary: Vec<String>,
    #[serde(rename = "TIMELINE")]
    pub timeline: Vec<String>,
    #[serde(rename = "TODOS")]
    pub todos: Vec<String>,
    #[serde(rename = "DECISIONS")]
    pub decisions: Vec<String>,
    #[serde(rename = "MONEY")]
    pub money: Vec<String>,
    #[serde(rename = "IDEAS")]
    pub ideas: Vec<String>,
    #[serde(rename = "QUESTIONS")]
    pub questions: Vec<String>,
}

impl Sections {
    pub fn get(&self, name: SectionName) -> &[String] {
        match name {
            SectionName::Summary => &self.summary,
            SectionName::Timeline => &self.timeline,
            SectionName::Todos => &self.todos,
            SectionName::Decisions => &self.decisions,
            SectionName::Money => &self.money,
            SectionName::Ideas => &self.ideas,
            SectionName::Questions => &self.questions,
        }
    }

    fn get_mut(&mut self, name: SectionName) -> &mut Vec<String> {
        match name {
            SectionName::Summary => &mut self.summary,
            SectionName::Timeline => &mut self.timeline,
            SectionName::Todos => &mut self.todos,
            SectionName::Decisions => &mut self.decisions,
            SectionName::Money => &mut self.money,
            SectionName::Ideas => &mut self.ideas,
            SectionName::Questions => &mut self.questions,
        }
    }

    /// Sections in document order.
    pub fn iter(&self) -> impl Iterator<Item = (SectionName, &[String])> + '_ {
        SectionName::ALL.into_iter().map(move |name| (name, self.get(name)))
    }

    /// True when the body has no non-whitespace content.
    pub fn is_blank(&self, name: SectionName) -> bool {
        self.get(name).iter().all(|line| line.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SplitOutcome {
    pub sections: Sections,
    /// `UNKNOWN_SECTION` issues in line order, then `MISSING_REQUIRED_SECTION`
    /// issues in section order.
    pub issues: Vec<ParseIssue>,
}

/// Bracketed uppercase name of a header line, e.g. `[TODOS]` -> `TODOS`.
fn header_name(line: &str) -> Option<&str> {
    let inner = line.trim().strip_prefix('[')?.strip_suffix(']')?;
    (!inner.is_empty() && inner.bytes().all(|b| b.is_ascii_uppercase())).then_some(inner)
}

/// Split text into section bodies. `\n`, `\r\n` and a lone `\r` all end a
/// line.
///
/// Lines before the first recognized header are dropped. An unrecognized
/// header is reported and does not change the current section, so lines
/// after it keep flowing into the last recognized one.
pub fn split_sections(text: &str) -> SplitOutcome {
    let mut out = SplitOutcome::default();
    let mut current: Option<SectionName> = None;

    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    for (i, line) in text.split('\n').enumerate() {
        if let Some(name) = header_name(line) {
            match name.parse::<SectionName>() {
                Ok(section) => current = Some(section),
                Err(_) => out.issues.push(ParseIssue::unknown_section(i + 1, name)),
            }
            continue;
        }

        if let Some(section) = current {
            out.sections.get_mut(section).push(line.to_string());
        }
    }

    for name in SectionName::ALL {
        if out.sections.is_blank(name) {
            out.issues.push(ParseIssue::missing_section(name));
        }
    }

    out
}
