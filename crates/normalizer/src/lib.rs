pub mod models;
pub mod payloads;
pub mod transform;

pub use models::{
    Identity, ItemState, LanguageBytes, RawCodeFrequencyWeek, RawCommitActivity, RawContributor,
    RawContributorStat, RawContributorWeek, RawIssue, RawPullRequest, RawRepository, RawReview,
    ReviewMap, ReviewState,
};
pub use payloads::{
    CodeFrequencyPayload, CommitActivityPayload, ContributorPayload, ContributorStatsPayload,
    IssuePayload, LanguagesPayload, PullRequestNode, RepoPayload,
};
pub use transform::{
    normalize_code_frequency, normalize_commit_activity, normalize_contributor_stats,
    normalize_contributors, normalize_issues, normalize_languages, normalize_pull_requests,
    normalize_repo, parse_timestamp,
};
