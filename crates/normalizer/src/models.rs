use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Identity {
    pub login: String,
    pub avatar_url: String,
}

impl Identity {
    pub fn new(login: impl Into<String>, avatar_url: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            avatar_url: avatar_url.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawRepository {
    pub name: String,
    pub full_name: String,
    pub owner: Identity,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Entry of the flat contributors listing; `contributions` is a lifetime total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawContributor {
    pub login: String,
    pub avatar_url: String,
    pub contributions: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawContributorWeek {
    /// Week start, epoch seconds.
    pub week: i64,
    pub additions: u64,
    pub deletions: u64,
    pub commits: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawContributorStat {
    pub author: Identity,
    pub total: u64,
    pub weeks: Vec<RawContributorWeek>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawCommitActivity {
    pub week: i64,
    pub total: u64,
    /// Sunday first.
    pub days: [u64; 7],
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawCodeFrequencyWeek {
    pub week: i64,
    pub additions: i64,
    pub deletions: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LanguageBytes {
    pub name: String,
    pub bytes: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Open,
    Closed,
}

impl ItemState {
    /// REST reports `open`/`closed`; GraphQL adds `MERGED`, which is closed.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "closed" | "merged" => ItemState::Closed,
            _ => ItemState::Open,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawPullRequest {
    pub number: u64,
    pub title: String,
    pub state: ItemState,
    pub author: Identity,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub merged_at: Option<DateTime<Utc>>,
    /// `None` when the source listing did not carry line counts.
    pub additions: Option<u64>,
    pub deletions: Option<u64>,
    pub comments: u64,
    pub review_comments: u64,
    pub commits: Option<u64>,
}

impl RawPullRequest {
    /// Total changed lines, only when both counts are known.
    pub fn changed_lines(&self) -> Option<u64> {
        match (self.additions, self.deletions) {
            (Some(additions), Some(deletions)) => Some(additions + deletions),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
    Pending,
}

impl ReviewState {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "APPROVED" => Some(ReviewState::Approved),
            "CHANGES_REQUESTED" => Some(ReviewState::ChangesRequested),
            "COMMENTED" => Some(ReviewState::Commented),
            "DISMISSED" => Some(ReviewState::Dismissed),
            "PENDING" => Some(ReviewState::Pending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawReview {
    /// `None` for deleted ("ghost") accounts.
    pub reviewer: Option<Identity>,
    pub state: ReviewState,
    pub submitted_at: DateTime<Utc>,
}

/// Reviews keyed by pull request number.
pub type ReviewMap = BTreeMap<u64, Vec<RawReview>>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawIssue {
    pub number: u64,
    pub title: String,
    pub state: ItemState,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub comments: u64,
}
