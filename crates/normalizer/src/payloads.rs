use std::collections::BTreeMap;

use serde::Deserialize;
use serde_with::{serde_as, DefaultOnNull};

// Timestamps stay as strings here so that one malformed value drops a single
// record in `transform` instead of failing the whole page.

#[derive(Debug, Clone, Deserialize)]
pub struct OwnerRef {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepoPayload {
    pub name: String,
    pub full_name: String,
    pub owner: OwnerRef,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub private: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContributorPayload {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub contributions: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContributorWeekPayload {
    pub w: i64,
    #[serde(default)]
    pub a: u64,
    #[serde(default)]
    pub d: u64,
    #[serde(default)]
    pub c: u64,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct ContributorStatsPayload {
    pub author: Option<OwnerRef>,
    #[serde(default)]
    pub total: u64,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub weeks: Vec<ContributorWeekPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitActivityPayload {
    pub week: i64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub days: Vec<u64>,
}

/// `[week_epoch, additions, deletions]`; deletions arrive negative.
pub type CodeFrequencyPayload = [i64; 3];

pub type LanguagesPayload = BTreeMap<String, u64>;

#[derive(Debug, Clone, Deserialize)]
pub struct IssuePayload {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub pull_request: Option<serde_json::Value>,
    #[serde(default)]
    pub comments: u64,
    pub created_at: String,
    pub closed_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorNode {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalCount {
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewNode {
    pub author: Option<ActorNode>,
    pub state: String,
    pub submitted_at: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewConnection {
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub nodes: Vec<Option<ReviewNode>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestNode {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub url: Option<String>,
    pub created_at: String,
    pub closed_at: Option<String>,
    pub merged_at: Option<String>,
    pub additions: Option<u64>,
    pub deletions: Option<u64>,
    pub author: Option<ActorNode>,
    pub commits: Option<TotalCount>,
    pub comments: Option<TotalCount>,
    pub reviews: Option<ReviewConnection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestConnection {
    #[serde(default)]
    pub page_info: PageInfo,
    #[serde_as(as = "DefaultOnNull")]
    #[serde(default)]
    pub nodes: Vec<Option<PullRequestNode>>,
}
