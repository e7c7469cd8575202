use std::future::Future;
use std::sync::Arc;

use analysis::{WrappedInputs, YearWindow};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use common::config::FetchConfig;
use http::StatusCode;
use normalizer::payloads::PullRequestConnection;
use normalizer::{
    normalize_code_frequency, normalize_commit_activity, normalize_contributor_stats,
    normalize_contributors, normalize_issues, normalize_languages, normalize_pull_requests,
    normalize_repo, parse_timestamp, CodeFrequencyPayload, CommitActivityPayload,
    ContributorPayload, ContributorStatsPayload, IssuePayload, LanguagesPayload, RawIssue,
    RawPullRequest, RepoPayload, ReviewMap,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::backoff::retry_delay;
use crate::client::{is_retryable, GithubApiError, GithubClient, StatsKind, StatsResponse};
use crate::metrics;

const PULL_REQUESTS_QUERY: &str = r#"
query RepoPullRequests($owner: String!, $name: String!, $perPage: Int!, $cursor: String) {
  repository(owner: $owner, name: $name) {
    pullRequests(first: $perPage, after: $cursor, orderBy: { field: CREATED_AT, direction: DESC }) {
      pageInfo {
        hasNextPage
        endCursor
      }
      nodes {
        number
        title
        state
        url
        createdAt
        closedAt
        mergedAt
        additions
        deletions
        author {
          login
          avatarUrl
        }
        commits { totalCount }
        comments { totalCount }
        reviews(first: 100) {
          nodes {
            author {
              login
              avatarUrl
            }
            state
            submittedAt
          }
        }
      }
    }
  }
}
"#;

/// Source of the raw records for one repository and year.
#[async_trait]
pub trait DataFetcher: Send + Sync {
    async fn fetch_inputs(
        &self,
        owner: &str,
        repo: &str,
        window: &YearWindow,
    ) -> Result<WrappedInputs>;
}

pub struct GithubDataFetcher {
    client: Arc<dyn GithubClient>,
    config: FetchConfig,
}

impl GithubDataFetcher {
    pub fn new(client: Arc<dyn GithubClient>, config: FetchConfig) -> Self {
        Self { client, config }
    }

    /// Repeats `call` while it fails with a rate limit or transport error, up to
    /// `request_retries` extra attempts.
    async fn with_retry<T, F, Fut>(&self, endpoint: &'static str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.config.request_retries && is_retryable(&err) => {
                    let delay = retry_delay(&self.config, attempt);
                    warn!(
                        endpoint,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "GitHub request attempt failed"
                    );
                    metrics::GITHUB_RETRIES_TOTAL
                        .with_label_values(&[endpoint])
                        .inc();
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn repository(&self, owner: &str, repo: &str) -> Result<RepoPayload> {
        let client = &self.client;
        let value = self
            .with_retry("repo", || client.get_repo(owner, repo))
            .await
            .with_context(|| format!("fetching repository {owner}/{repo}"))?;
        serde_json::from_value(value).context("decoding repository payload")
    }

    async fn contributors(&self, owner: &str, repo: &str) -> Result<Vec<ContributorPayload>> {
        let client = &self.client;
        let per_page = self.config.page_size;
        let values = self
            .with_retry("contributors", || {
                client.list_contributors(owner, repo, per_page)
            })
            .await
            .with_context(|| format!("listing contributors of {owner}/{repo}"))?;
        values
            .into_iter()
            .map(|value| serde_json::from_value(value).context("decoding contributor"))
            .collect()
    }

    async fn languages(&self, owner: &str, repo: &str) -> Result<LanguagesPayload> {
        let client = &self.client;
        let value = self
            .with_retry("languages", || client.get_languages(owner, repo))
            .await
            .with_context(|| format!("fetching languages of {owner}/{repo}"))?;
        decode_or_default(value, "languages")
    }

    /// Polls a statistics endpoint until GitHub has computed it. Gives up with an
    /// empty result once the retries are spent.
    #[instrument(skip(self), fields(stat = kind.as_str()))]
    async fn stats<T>(&self, owner: &str, repo: &str, kind: StatsKind) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let client = &self.client;
        let mut attempt = 0u32;
        loop {
            let response = self
                .with_retry(kind.as_str(), || client.get_stats(owner, repo, kind))
                .await
                .with_context(|| format!("fetching {} for {owner}/{repo}", kind.as_str()))?;
            match response {
                StatsResponse::Ready(value) => return decode_or_default(value, kind.as_str()),
                StatsResponse::Computing if attempt >= self.config.stats_retries => {
                    warn!(
                        attempts = attempt + 1,
                        "statistics still being computed, continuing without them"
                    );
                    return Ok(T::default());
                }
                StatsResponse::Computing => {
                    metrics::STATS_RETRIES_TOTAL
                        .with_label_values(&[kind.as_str()])
                        .inc();
                    let delay = retry_delay(&self.config, attempt);
                    debug!(attempt, delay_ms = delay.as_millis() as u64, "statistics not ready");
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    #[instrument(skip(self, window), fields(year = window.year()))]
    async fn pull_requests(
        &self,
        owner: &str,
        repo: &str,
        window: &YearWindow,
    ) -> Result<(Vec<RawPullRequest>, ReviewMap)> {
        let mut nodes = Vec::new();
        let mut cursor: Option<String> = None;
        for page in 0..self.config.max_pages {
            let variables = json!({
                "owner": owner,
                "name": repo,
                "perPage": self.config.page_size,
                "cursor": cursor,
            });
            let client = &self.client;
            let data = self
                .with_retry("graphql", || {
                    client.graphql(PULL_REQUESTS_QUERY, variables.clone())
                })
                .await
                .with_context(|| format!("listing pull requests of {owner}/{repo}"))?;
            let connection = data
                .get("repository")
                .filter(|repository| !repository.is_null())
                .ok_or_else(|| GithubApiError::status(StatusCode::NOT_FOUND, "graphql"))?
                .get("pullRequests")
                .cloned()
                .ok_or_else(|| anyhow!("pull request connection missing"))?;
            let connection: PullRequestConnection =
                serde_json::from_value(connection).context("decoding pull request page")?;

            let page_nodes: Vec<_> = connection.nodes.into_iter().flatten().collect();
            let reached_older = page_nodes
                .last()
                .and_then(|node| parse_timestamp(&node.created_at))
                .is_some_and(|oldest| oldest < window.start());
            debug!(page, count = page_nodes.len(), "pull request page");
            nodes.extend(page_nodes);

            if reached_older || !connection.page_info.has_next_page {
                break;
            }
            cursor = connection.page_info.end_cursor;
            if cursor.is_none() {
                break;
            }
        }

        let (pull_requests, mut reviews) = normalize_pull_requests(&nodes);
        let pull_requests: Vec<RawPullRequest> = pull_requests
            .into_iter()
            .filter(|pr| window.contains(pr.created_at))
            .collect();
        reviews.retain(|number, _| pull_requests.iter().any(|pr| pr.number == *number));
        Ok((pull_requests, reviews))
    }

    #[instrument(skip(self, window), fields(year = window.year()))]
    async fn issues(&self, owner: &str, repo: &str, window: &YearWindow) -> Result<Vec<RawIssue>> {
        let mut payloads: Vec<IssuePayload> = Vec::new();
        for page in 1..=self.config.max_pages {
            let client = &self.client;
            let per_page = self.config.page_size;
            let values = self
                .with_retry("issues", || client.list_issues(owner, repo, page, per_page))
                .await
                .with_context(|| format!("listing issues of {owner}/{repo} page {page}"))?;
            if values.is_empty() {
                break;
            }
            let batch: Vec<IssuePayload> = values
                .into_iter()
                .map(|value| serde_json::from_value(value).context("decoding issue"))
                .collect::<Result<_>>()?;
            let reached_older = batch
                .last()
                .and_then(|issue| parse_timestamp(&issue.created_at))
                .is_some_and(|oldest| oldest < window.start());
            let full_page = batch.len() as u32 >= self.config.page_size;
            debug!(page, count = batch.len(), "issue page");
            payloads.extend(batch);
            if reached_older || !full_page {
                break;
            }
        }

        Ok(normalize_issues(&payloads)
            .into_iter()
            .filter(|issue| window.contains(issue.created_at))
            .collect())
    }
}

#[async_trait]
impl DataFetcher for GithubDataFetcher {
    #[instrument(skip(self, window), fields(year = window.year()))]
    async fn fetch_inputs(
        &self,
        owner: &str,
        repo: &str,
        window: &YearWindow,
    ) -> Result<WrappedInputs> {
        let (
            repository,
            contributors,
            contributor_stats,
            commit_activity,
            code_frequency,
            languages,
            (pull_requests, reviews),
            issues,
        ) = tokio::try_join!(
            self.repository(owner, repo),
            self.contributors(owner, repo),
            self.stats::<Vec<ContributorStatsPayload>>(owner, repo, StatsKind::Contributors),
            self.stats::<Vec<CommitActivityPayload>>(owner, repo, StatsKind::CommitActivity),
            self.stats::<Vec<CodeFrequencyPayload>>(owner, repo, StatsKind::CodeFrequency),
            self.languages(owner, repo),
            self.pull_requests(owner, repo, window),
            self.issues(owner, repo, window),
        )?;

        let inputs = WrappedInputs {
            repository: normalize_repo(&repository)?,
            contributors: normalize_contributors(&contributors),
            contributor_stats: normalize_contributor_stats(&contributor_stats),
            commit_activity: normalize_commit_activity(&commit_activity),
            code_frequency: normalize_code_frequency(&code_frequency),
            languages: normalize_languages(&languages),
            pull_requests,
            issues,
            reviews,
        };
        info!(
            pull_requests = inputs.pull_requests.len(),
            issues = inputs.issues.len(),
            contributors = inputs.contributors.len(),
            "fetched repository activity"
        );
        Ok(inputs)
    }
}

/// `null` and `{}` bodies (empty repositories) decode to the default.
fn decode_or_default<T>(value: Value, label: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    match &value {
        Value::Null => Ok(T::default()),
        Value::Object(map) if map.is_empty() => Ok(T::default()),
        _ => serde_json::from_value(value).with_context(|| format!("decoding {label} payload")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn empty_bodies_decode_to_default() {
        let stats: Vec<CommitActivityPayload> =
            decode_or_default(Value::Null, "commit_activity").unwrap();
        assert!(stats.is_empty());
        let frequency: Vec<CodeFrequencyPayload> =
            decode_or_default(json!({}), "code_frequency").unwrap();
        assert!(frequency.is_empty());
        let languages: BTreeMap<String, u64> =
            decode_or_default(json!({"Rust": 10}), "languages").unwrap();
        assert_eq!(languages["Rust"], 10);
    }

    #[test]
    fn malformed_body_is_an_error() {
        let result: Result<Vec<CommitActivityPayload>> =
            decode_or_default(json!("oops"), "commit_activity");
        assert!(result.is_err());
    }
}
