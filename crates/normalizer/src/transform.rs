use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::models::{
    Identity, ItemState, LanguageBytes, RawCodeFrequencyWeek, RawCommitActivity, RawContributor,
    RawContributorStat, RawContributorWeek, RawIssue, RawPullRequest, RawRepository, RawReview,
    ReviewMap, ReviewState,
};
use crate::payloads::{
    ActorNode, CodeFrequencyPayload, CommitActivityPayload, ContributorPayload,
    ContributorStatsPayload, IssuePayload, LanguagesPayload, OwnerRef, PullRequestNode,
    RepoPayload,
};

pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_optional(value: Option<&str>, field: &'static str, number: u64) -> Option<DateTime<Utc>> {
    let raw = value?;
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        warn!(field, number, value = raw, "unparsable timestamp treated as absent");
    }
    parsed
}

fn identity_from_owner(owner: &OwnerRef) -> Identity {
    Identity::new(owner.login.clone(), owner.avatar_url.clone())
}

fn identity_from_actor(actor: &ActorNode) -> Identity {
    Identity::new(actor.login.clone(), actor.avatar_url.clone())
}

pub fn normalize_repo(payload: &RepoPayload) -> Result<RawRepository> {
    let created_at = parse_timestamp(&payload.created_at)
        .ok_or_else(|| anyhow!("invalid repository created_at: {}", payload.created_at))?;
    let updated_at = parse_timestamp(&payload.updated_at)
        .ok_or_else(|| anyhow!("invalid repository updated_at: {}", payload.updated_at))?;
    Ok(RawRepository {
        name: payload.name.clone(),
        full_name: payload.full_name.clone(),
        owner: identity_from_owner(&payload.owner),
        description: payload.description.clone(),
        language: payload.language.clone(),
        stars: payload.stargazers_count,
        forks: payload.forks_count,
        is_private: payload.private,
        created_at,
        updated_at,
    })
}

pub fn normalize_contributors(payloads: &[ContributorPayload]) -> Vec<RawContributor> {
    payloads
        .iter()
        .map(|payload| RawContributor {
            login: payload.login.clone(),
            avatar_url: payload.avatar_url.clone(),
            contributions: payload.contributions,
        })
        .collect()
}

pub fn normalize_contributor_stats(
    payloads: &[ContributorStatsPayload],
) -> Vec<RawContributorStat> {
    payloads
        .iter()
        .filter_map(|payload| {
            let author = payload.author.as_ref()?;
            Some(RawContributorStat {
                author: identity_from_owner(author),
                total: payload.total,
                weeks: payload
                    .weeks
                    .iter()
                    .map(|week| RawContributorWeek {
                        week: week.w,
                        additions: week.a,
                        deletions: week.d,
                        commits: week.c,
                    })
                    .collect(),
            })
        })
        .collect()
}

pub fn normalize_commit_activity(payloads: &[CommitActivityPayload]) -> Vec<RawCommitActivity> {
    payloads
        .iter()
        .filter_map(|payload| {
            let days: [u64; 7] = match payload.days.as_slice().try_into() {
                Ok(days) => days,
                Err(_) => {
                    warn!(
                        week = payload.week,
                        len = payload.days.len(),
                        "commit activity week without seven day buckets skipped"
                    );
                    return None;
                }
            };
            Some(RawCommitActivity {
                week: payload.week,
                total: payload.total,
                days,
            })
        })
        .collect()
}

pub fn normalize_code_frequency(payloads: &[CodeFrequencyPayload]) -> Vec<RawCodeFrequencyWeek> {
    payloads
        .iter()
        .map(|[week, additions, deletions]| RawCodeFrequencyWeek {
            week: *week,
            additions: *additions,
            deletions: *deletions,
        })
        .collect()
}

pub fn normalize_languages(payload: &LanguagesPayload) -> Vec<LanguageBytes> {
    payload
        .iter()
        .map(|(name, bytes)| LanguageBytes {
            name: name.clone(),
            bytes: *bytes,
        })
        .collect()
}

/// Drops PR-backed entries (the issues listing mixes both) and entries whose
/// creation time does not parse.
pub fn normalize_issues(payloads: &[IssuePayload]) -> Vec<RawIssue> {
    payloads
        .iter()
        .filter(|payload| payload.pull_request.is_none())
        .filter_map(|payload| {
            let Some(created_at) = parse_timestamp(&payload.created_at) else {
                warn!(
                    number = payload.number,
                    value = %payload.created_at,
                    "issue with unparsable created_at skipped"
                );
                return None;
            };
            Some(RawIssue {
                number: payload.number,
                title: payload.title.clone(),
                state: ItemState::parse(&payload.state),
                created_at,
                closed_at: parse_optional(
                    payload.closed_at.as_deref(),
                    "closed_at",
                    payload.number,
                ),
                comments: payload.comments,
            })
        })
        .collect()
}

fn normalize_reviews(node: &PullRequestNode) -> Vec<RawReview> {
    let Some(connection) = node.reviews.as_ref() else {
        return Vec::new();
    };
    connection
        .nodes
        .iter()
        .flatten()
        .filter_map(|review| {
            let Some(state) = ReviewState::parse(&review.state) else {
                warn!(number = node.number, state = %review.state, "unknown review state skipped");
                return None;
            };
            // Pending drafts carry no submission time; they never reach the aggregates anyway.
            let submitted_at = review.submitted_at.as_deref().and_then(parse_timestamp)?;
            Some(RawReview {
                reviewer: review.author.as_ref().map(identity_from_actor),
                state,
                submitted_at,
            })
        })
        .collect()
}

fn normalize_pull_request(node: &PullRequestNode) -> Option<RawPullRequest> {
    let Some(created_at) = parse_timestamp(&node.created_at) else {
        warn!(
            number = node.number,
            value = %node.created_at,
            "pull request with unparsable created_at skipped"
        );
        return None;
    };
    let author = node
        .author
        .as_ref()
        .map(identity_from_actor)
        .unwrap_or_else(|| Identity::new("unknown", ""));
    Some(RawPullRequest {
        number: node.number,
        title: node.title.clone(),
        state: ItemState::parse(&node.state),
        author,
        url: node.url.clone(),
        created_at,
        closed_at: parse_optional(node.closed_at.as_deref(), "closed_at", node.number),
        merged_at: parse_optional(node.merged_at.as_deref(), "merged_at", node.number),
        additions: Some(node.additions.unwrap_or(0)),
        deletions: Some(node.deletions.unwrap_or(0)),
        comments: node.comments.as_ref().map(|c| c.total_count).unwrap_or(0),
        review_comments: 0,
        commits: Some(node.commits.as_ref().map(|c| c.total_count).unwrap_or(0)),
    })
}

/// Converts GraphQL pull request nodes into raw records plus the review map.
pub fn normalize_pull_requests(nodes: &[PullRequestNode]) -> (Vec<RawPullRequest>, ReviewMap) {
    let mut pull_requests = Vec::with_capacity(nodes.len());
    let mut reviews = ReviewMap::new();
    for node in nodes {
        let Some(pr) = normalize_pull_request(node) else {
            continue;
        };
        if node.reviews.is_some() {
            reviews.insert(pr.number, normalize_reviews(node));
        }
        pull_requests.push(pr);
    }
    (pull_requests, reviews)
}
