use normalizer::{ItemState, RawIssue};
use serde::Serialize;

use crate::rank::{first_max_by, hours, mean};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActiveIssue {
    pub number: u64,
    pub title: String,
    pub comments: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IssueStats {
    pub opened: u64,
    pub closed: u64,
    pub average_close_time_hours: f64,
    pub most_active_issue: Option<ActiveIssue>,
}

/// Expects issues already restricted to the year with PR-backed entries removed.
pub fn issue_stats(issues: &[RawIssue]) -> IssueStats {
    let closed: Vec<&RawIssue> = issues
        .iter()
        .filter(|issue| issue.state == ItemState::Closed)
        .collect();

    let close_times: Vec<f64> = closed
        .iter()
        .filter_map(|issue| issue.closed_at.map(|at| hours(at - issue.created_at)))
        .collect();

    let most_active_issue = first_max_by(issues.iter(), |issue| issue.comments)
        .filter(|issue| issue.comments > 0)
        .map(|issue| ActiveIssue {
            number: issue.number,
            title: issue.title.clone(),
            comments: issue.comments,
        });

    IssueStats {
        opened: issues.len() as u64,
        closed: closed.len() as u64,
        average_close_time_hours: mean(close_times.iter().sum(), close_times.len()),
        most_active_issue,
    }
}
