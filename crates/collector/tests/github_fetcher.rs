use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use analysis::YearWindow;
use anyhow::Result;
use async_trait::async_trait;
use collector::{
    DataFetcher, GithubApiError, GithubClient, GithubDataFetcher, StatsKind, StatsResponse,
};
use common::config::FetchConfig;
use http::StatusCode;
use serde_json::{json, Value};

#[derive(Default)]
struct StubClient {
    /// Number of 202 answers before each stats endpoint is ready. Missing kinds never finish.
    stats_pending: HashMap<StatsKind, u32>,
    stats_calls: Mutex<HashMap<StatsKind, u32>>,
    issue_pages: Vec<Vec<Value>>,
    issue_calls: AtomicU32,
    pr_pages: Vec<Value>,
    graphql_cursors: Mutex<Vec<Value>>,
    missing_repo: bool,
    /// Leading repo calls answered with 403 (secondary rate limit).
    repo_forbidden: u32,
    repo_calls: AtomicU32,
    /// Leading GraphQL calls answered with a rate limit error.
    graphql_rate_limited: u32,
}

impl StubClient {
    fn stats_calls(&self, kind: StatsKind) -> u32 {
        self.stats_calls
            .lock()
            .unwrap()
            .get(&kind)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl GithubClient for StubClient {
    async fn get_repo(&self, owner: &str, repo: &str) -> Result<Value> {
        let call = self.repo_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.repo_forbidden {
            return Err(GithubApiError::status(
                StatusCode::FORBIDDEN,
                format!("repos/{owner}/{repo}"),
            )
            .into());
        }
        if self.missing_repo {
            return Err(GithubApiError::status(
                StatusCode::NOT_FOUND,
                format!("repos/{owner}/{repo}"),
            )
            .into());
        }
        Ok(json!({
            "name": repo,
            "full_name": format!("{owner}/{repo}"),
            "owner": {"login": owner, "avatar_url": "https://avatars/acme.png"},
            "description": "Widgets",
            "language": "Rust",
            "stargazers_count": 42,
            "forks_count": 7,
            "private": false,
            "created_at": "2020-01-01T00:00:00Z",
            "updated_at": "2024-12-01T00:00:00Z"
        }))
    }

    async fn list_contributors(&self, _: &str, _: &str, _: u32) -> Result<Vec<Value>> {
        Ok(vec![
            json!({"login": "alice", "avatar_url": "a.png", "contributions": 120}),
            json!({"login": "bob", "avatar_url": "b.png", "contributions": 30}),
        ])
    }

    async fn get_stats(&self, _: &str, _: &str, kind: StatsKind) -> Result<StatsResponse> {
        let calls = {
            let mut guard = self.stats_calls.lock().unwrap();
            let entry = guard.entry(kind).or_insert(0);
            *entry += 1;
            *entry
        };
        let Some(pending) = self.stats_pending.get(&kind) else {
            return Ok(StatsResponse::Computing);
        };
        if calls <= *pending {
            return Ok(StatsResponse::Computing);
        }
        let body = match kind {
            StatsKind::Contributors => json!([
                {"author": {"login": "alice", "avatar_url": "a.png"}, "total": 12,
                 "weeks": [{"w": 1_704_672_000, "a": 300, "d": 20, "c": 12}]}
            ]),
            StatsKind::CommitActivity => json!([
                {"week": 1_704_585_600, "total": 4, "days": [0, 1, 1, 1, 1, 0, 0]}
            ]),
            StatsKind::CodeFrequency => json!([[1_704_585_600, 300, -20]]),
        };
        Ok(StatsResponse::Ready(body))
    }

    async fn get_languages(&self, _: &str, _: &str) -> Result<Value> {
        Ok(json!({"Rust": 900, "Shell": 100}))
    }

    async fn list_issues(&self, _: &str, _: &str, page: u32, _: u32) -> Result<Vec<Value>> {
        self.issue_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .issue_pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default())
    }

    async fn graphql(&self, _: &str, variables: Value) -> Result<Value> {
        let cursor = variables["cursor"].clone();
        let index = {
            let mut cursors = self.graphql_cursors.lock().unwrap();
            cursors.push(cursor);
            cursors.len() - 1
        };
        if (index as u32) < self.graphql_rate_limited {
            return Err(GithubApiError::status(StatusCode::TOO_MANY_REQUESTS, "graphql").into());
        }
        let index = index - self.graphql_rate_limited as usize;
        if self.missing_repo {
            return Ok(json!({"repository": null}));
        }
        Ok(self
            .pr_pages
            .get(index)
            .cloned()
            .unwrap_or_else(|| json!({"repository": {"pullRequests": {"nodes": []}}})))
    }
}

fn fast_config() -> FetchConfig {
    FetchConfig {
        stats_retries: 3,
        request_retries: 3,
        retry_base_ms: 1,
        retry_max_ms: 2,
        jitter_frac: 0.0,
        page_size: 2,
        max_pages: 5,
        timeout_secs: 5,
    }
}

fn issue(number: u64, created_at: &str, pull_request: bool) -> Value {
    let mut value = json!({
        "number": number,
        "title": format!("issue {number}"),
        "state": "open",
        "comments": 1,
        "created_at": created_at,
        "closed_at": null
    });
    if pull_request {
        value["pull_request"] = json!({"url": "https://api.github.com/pulls/1"});
    }
    value
}

fn pr(number: u64, created_at: &str, reviews: Value) -> Value {
    json!({
        "number": number,
        "title": format!("PR {number}"),
        "state": "OPEN",
        "url": format!("https://github.com/acme/widget/pull/{number}"),
        "createdAt": created_at,
        "closedAt": null,
        "mergedAt": null,
        "additions": 10,
        "deletions": 2,
        "author": {"login": "alice", "avatarUrl": "a.png"},
        "commits": {"totalCount": 1},
        "comments": {"totalCount": 0},
        "reviews": {"nodes": reviews}
    })
}

fn pr_page(nodes: Vec<Value>, next: Option<&str>) -> Value {
    json!({
        "repository": {
            "pullRequests": {
                "pageInfo": {"hasNextPage": next.is_some(), "endCursor": next},
                "nodes": nodes
            }
        }
    })
}

fn populated_client() -> StubClient {
    let review = json!([{
        "author": {"login": "bob", "avatarUrl": "b.png"},
        "state": "APPROVED",
        "submittedAt": "2024-06-02T00:00:00Z"
    }]);
    let old_review = json!([{
        "author": {"login": "carol", "avatarUrl": "c.png"},
        "state": "COMMENTED",
        "submittedAt": "2023-11-02T00:00:00Z"
    }]);
    StubClient {
        stats_pending: HashMap::from([
            (StatsKind::Contributors, 2),
            (StatsKind::CodeFrequency, 0),
        ]),
        issue_pages: vec![
            vec![
                issue(40, "2024-05-01T00:00:00Z", false),
                issue(39, "2024-04-01T00:00:00Z", true),
            ],
            vec![
                issue(30, "2024-02-01T00:00:00Z", false),
                issue(12, "2023-12-30T00:00:00Z", false),
            ],
            vec![issue(5, "2023-06-01T00:00:00Z", false)],
        ],
        pr_pages: vec![
            pr_page(
                vec![
                    pr(3, "2024-06-01T00:00:00Z", review),
                    pr(2, "2024-03-01T00:00:00Z", json!([])),
                ],
                Some("c1"),
            ),
            pr_page(vec![pr(1, "2023-11-01T00:00:00Z", old_review)], Some("c2")),
            pr_page(vec![pr(0, "2023-01-01T00:00:00Z", json!([]))], None),
        ],
        ..StubClient::default()
    }
}

#[tokio::test]
async fn fetch_collects_and_filters_to_the_year() {
    let client = Arc::new(populated_client());
    let fetcher = GithubDataFetcher::new(client.clone(), fast_config());
    let window = YearWindow::for_year(2024).unwrap();

    let inputs = fetcher.fetch_inputs("acme", "widget", &window).await.unwrap();

    assert_eq!(inputs.repository.full_name, "acme/widget");
    assert_eq!(inputs.repository.stars, 42);
    assert_eq!(inputs.contributors.len(), 2);
    assert_eq!(inputs.contributor_stats.len(), 1);
    assert_eq!(inputs.code_frequency.len(), 1);
    assert_eq!(inputs.languages.len(), 2);

    let numbers: Vec<u64> = inputs.pull_requests.iter().map(|pr| pr.number).collect();
    assert_eq!(numbers, vec![3, 2]);
    assert_eq!(inputs.reviews.keys().copied().collect::<Vec<_>>(), vec![2, 3]);
    assert_eq!(inputs.reviews[&3].len(), 1);

    let issues: Vec<u64> = inputs.issues.iter().map(|issue| issue.number).collect();
    assert_eq!(issues, vec![40, 30]);
}

#[tokio::test]
async fn paging_stops_once_the_year_is_passed() {
    let client = Arc::new(populated_client());
    let fetcher = GithubDataFetcher::new(client.clone(), fast_config());
    let window = YearWindow::for_year(2024).unwrap();

    fetcher.fetch_inputs("acme", "widget", &window).await.unwrap();

    assert_eq!(client.issue_calls.load(Ordering::SeqCst), 2);
    let cursors = client.graphql_cursors.lock().unwrap().clone();
    assert_eq!(cursors, vec![Value::Null, json!("c1")]);
}

#[tokio::test]
async fn stats_are_polled_until_ready_or_retries_run_out() {
    let client = Arc::new(populated_client());
    let fetcher = GithubDataFetcher::new(client.clone(), fast_config());
    let window = YearWindow::for_year(2024).unwrap();

    let inputs = fetcher.fetch_inputs("acme", "widget", &window).await.unwrap();

    // Two 202 answers, then the payload.
    assert_eq!(client.stats_calls(StatsKind::Contributors), 3);
    assert_eq!(client.stats_calls(StatsKind::CodeFrequency), 1);
    // Never ready: the first poll plus three retries, then an empty series.
    assert_eq!(client.stats_calls(StatsKind::CommitActivity), 4);
    assert!(inputs.commit_activity.is_empty());
}

#[tokio::test]
async fn missing_repository_surfaces_not_found() {
    let client = Arc::new(StubClient {
        missing_repo: true,
        ..StubClient::default()
    });
    let fetcher = GithubDataFetcher::new(client.clone(), fast_config());
    let window = YearWindow::for_year(2024).unwrap();

    let err = fetcher
        .fetch_inputs("acme", "ghost", &window)
        .await
        .unwrap_err();
    let api = GithubApiError::find(&err).expect("typed GitHub error");
    assert_eq!(api.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(client.repo_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rate_limited_calls_are_retried() {
    let client = Arc::new(StubClient {
        repo_forbidden: 1,
        graphql_rate_limited: 2,
        ..populated_client()
    });
    let fetcher = GithubDataFetcher::new(client.clone(), fast_config());
    let window = YearWindow::for_year(2024).unwrap();

    let inputs = fetcher.fetch_inputs("acme", "widget", &window).await.unwrap();

    assert_eq!(client.repo_calls.load(Ordering::SeqCst), 2);
    assert_eq!(inputs.repository.full_name, "acme/widget");
    let numbers: Vec<u64> = inputs.pull_requests.iter().map(|pr| pr.number).collect();
    assert_eq!(numbers, vec![3, 2]);
    let cursors = client.graphql_cursors.lock().unwrap().clone();
    assert_eq!(cursors, vec![Value::Null, Value::Null, Value::Null, json!("c1")]);
}

#[tokio::test]
async fn persistent_rate_limit_gives_up_after_retries() {
    let client = Arc::new(StubClient {
        repo_forbidden: u32::MAX,
        ..populated_client()
    });
    let fetcher = GithubDataFetcher::new(client.clone(), fast_config());
    let window = YearWindow::for_year(2024).unwrap();

    let err = fetcher
        .fetch_inputs("acme", "widget", &window)
        .await
        .unwrap_err();
    let api = GithubApiError::find(&err).expect("typed GitHub error");
    assert_eq!(api.status_code(), StatusCode::FORBIDDEN);
    // First attempt plus three retries.
    assert_eq!(client.repo_calls.load(Ordering::SeqCst), 4);
}
