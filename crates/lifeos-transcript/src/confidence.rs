use serde::{Deserialize, Serialize};

use crate::issue::ParseIssue;

pub const CRITICAL_PENALTY: u32 = 25;
pub const WARNING_PENALTY: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceReport {
    /// `100 - 25*critical - 5*other`, floored at 0.
    pub score: u32,
    /// Any critical issue present; callers must not commit when set.
    pub global_critical: bool,
}

/// Score an issue list. Pure function of the issues, nothing else.
pub fn score_issues(issues: &[ParseIssue]) -> ConfidenceReport {
    let critical = issues.iter().filter(|i| i.critical).count();
    let other = issues.len() - critical;
    let penalty = (critical as u64)
        .saturating_mul(CRITICAL_PENALTY.into())
        .saturating_add((other as u64).saturating_mul(WARNING_PENALTY.into()));
    ConfidenceReport {
        score: 100u64.saturating_sub(penalty) as u32,
        global_critical: critical > 0,
    }
}

/// Concatenate issue groups in the order given.
pub fn collect_issues<I>(groups: I) -> Vec<ParseIssue>
where
    I: IntoIterator<Item = Vec<ParseIssue>>,
{
    groups.into_iter().flatten().collect()
}
