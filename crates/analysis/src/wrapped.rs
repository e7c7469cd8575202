use chrono::{DateTime, Utc};
use normalizer::{
    LanguageBytes, RawCodeFrequencyWeek, RawCommitActivity, RawContributor, RawContributorStat,
    RawIssue, RawPullRequest, RawRepository, ReviewMap,
};
use serde::Serialize;
use tracing::debug;

use crate::activity::{activity_stats, ActivityStats};
use crate::code_changes::{code_change_stats, CodeChangeStats};
use crate::commits::{commit_stats, CommitStats};
use crate::community::{community_stats, CommunityStats};
use crate::contributors::{contributor_stats, ContributorStats};
use crate::issues::{issue_stats, IssueStats};
use crate::personality::{winner, Personality, PersonalitySignals};
use crate::pull_requests::{pull_request_stats, PullRequestStats};
use crate::reviews::{review_stats, ReviewStats};
use crate::velocity::{velocity_stats, VelocityStats};
use crate::window::YearWindow;

/// Raw snapshot for one repository and year. PRs and issues are expected to be
/// pre-filtered to the year by the fetcher.
#[derive(Debug, Clone)]
pub struct WrappedInputs {
    pub repository: RawRepository,
    pub contributors: Vec<RawContributor>,
    pub contributor_stats: Vec<RawContributorStat>,
    pub commit_activity: Vec<RawCommitActivity>,
    pub code_frequency: Vec<RawCodeFrequencyWeek>,
    pub languages: Vec<LanguageBytes>,
    pub pull_requests: Vec<RawPullRequest>,
    pub issues: Vec<RawIssue>,
    pub reviews: ReviewMap,
}

impl WrappedInputs {
    /// A repository with no recorded activity.
    pub fn empty(repository: RawRepository) -> Self {
        Self {
            repository,
            contributors: Vec::new(),
            contributor_stats: Vec::new(),
            commit_activity: Vec::new(),
            code_frequency: Vec::new(),
            languages: Vec::new(),
            pull_requests: Vec::new(),
            issues: Vec::new(),
            reviews: ReviewMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepoOwner {
    pub login: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepoSummary {
    pub name: String,
    pub full_name: String,
    pub owner: RepoOwner,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&RawRepository> for RepoSummary {
    fn from(repo: &RawRepository) -> Self {
        Self {
            name: repo.name.clone(),
            full_name: repo.full_name.clone(),
            owner: RepoOwner {
                login: repo.owner.login.clone(),
                avatar_url: repo.owner.avatar_url.clone(),
            },
            description: repo.description.clone(),
            language: repo.language.clone(),
            stars: repo.stars,
            forks: repo.forks,
            is_private: repo.is_private,
            created_at: repo.created_at,
            updated_at: repo.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WrappedResult {
    pub repo: RepoSummary,
    pub year: i32,
    pub commits: CommitStats,
    pub pull_requests: PullRequestStats,
    pub reviews: ReviewStats,
    pub issues: IssueStats,
    pub contributors: ContributorStats,
    pub code_changes: CodeChangeStats,
    pub community: CommunityStats,
    pub activity: ActivityStats,
    pub velocity: VelocityStats,
    pub personality: Personality,
    pub generated_at: DateTime<Utc>,
}

pub fn assemble_wrapped(
    inputs: &WrappedInputs,
    window: &YearWindow,
    generated_at: DateTime<Utc>,
) -> WrappedResult {
    let pull_requests = pull_request_stats(&inputs.pull_requests);
    let reviews = review_stats(&inputs.pull_requests, &inputs.reviews);
    let velocity = velocity_stats(&inputs.pull_requests, window);
    let contributors = contributor_stats(
        &inputs.contributors,
        &inputs.contributor_stats,
        &inputs.pull_requests,
        &inputs.reviews,
        window,
    );
    let (archetype, outcome) = winner(&PersonalitySignals {
        pull_requests: &pull_requests,
        reviews: &reviews,
        velocity: &velocity,
        contributors: &contributors,
    });
    let personality = Personality::from(archetype);

    let result = WrappedResult {
        repo: RepoSummary::from(&inputs.repository),
        year: window.year(),
        commits: commit_stats(
            &inputs.commit_activity,
            &inputs.contributor_stats,
            &inputs.contributors,
            window,
        ),
        pull_requests,
        reviews,
        issues: issue_stats(&inputs.issues),
        contributors,
        code_changes: code_change_stats(
            &inputs.code_frequency,
            &inputs.languages,
            window,
            Some(inputs.pull_requests.as_slice()),
        ),
        community: community_stats(&inputs.repository),
        activity: activity_stats(&inputs.commit_activity, window),
        velocity,
        personality,
        generated_at,
    };

    debug!(
        repo = %result.repo.full_name,
        year = result.year,
        prs = result.pull_requests.opened,
        issues = result.issues.opened,
        commits = result.commits.total_this_year,
        personality = ?result.personality.archetype,
        personality_score = outcome.score,
        personality_reasons = ?outcome.reasons,
        "wrapped summary assembled"
    );
    result
}
