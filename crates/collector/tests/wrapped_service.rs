use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use analysis::{WrappedInputs, YearWindow};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use collector::{DataFetcher, GithubApiError, LruWrappedCache, WrappedService};
use common::AppError;
use http::StatusCode;
use normalizer::{Identity, ItemState, RawPullRequest, RawRepository};

#[derive(Clone, Copy)]
enum Outcome {
    Ok,
    Unavailable,
    Missing,
}

struct CountingFetcher {
    calls: AtomicUsize,
    outcome: Outcome,
}

impl CountingFetcher {
    fn new(outcome: Outcome) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            outcome,
        }
    }
}

#[async_trait]
impl DataFetcher for CountingFetcher {
    async fn fetch_inputs(
        &self,
        owner: &str,
        repo: &str,
        window: &YearWindow,
    ) -> Result<WrappedInputs> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.outcome {
            Outcome::Ok => {}
            Outcome::Unavailable => return Err(anyhow!("upstream unavailable")),
            Outcome::Missing => {
                return Err(GithubApiError::status(
                    StatusCode::NOT_FOUND,
                    format!("repos/{owner}/{repo}"),
                )
                .into())
            }
        }
        let at = Utc.with_ymd_and_hms(window.year(), 3, 1, 12, 0, 0).unwrap();
        let mut inputs = WrappedInputs::empty(RawRepository {
            name: repo.to_string(),
            full_name: format!("{owner}/{repo}"),
            owner: Identity::new(owner, ""),
            description: None,
            language: Some("Rust".into()),
            stars: 3,
            forks: 1,
            is_private: false,
            created_at: at,
            updated_at: at,
        });
        inputs.pull_requests.push(RawPullRequest {
            number: 1,
            title: "First".into(),
            state: ItemState::Open,
            author: Identity::new("alice", ""),
            url: None,
            created_at: at,
            closed_at: None,
            merged_at: None,
            additions: Some(5),
            deletions: Some(1),
            comments: 0,
            review_comments: 0,
            commits: Some(1),
        });
        Ok(inputs)
    }
}

fn service(fetcher: Arc<CountingFetcher>) -> WrappedService {
    let cache = Arc::new(LruWrappedCache::new(8, Duration::from_secs(300)));
    WrappedService::new(fetcher, cache)
}

#[tokio::test]
async fn second_request_is_served_from_cache() {
    let fetcher = Arc::new(CountingFetcher::new(Outcome::Ok));
    let service = service(fetcher.clone());

    let first = service.wrapped("acme", "widget", 2024).await.unwrap();
    let second = service.wrapped("acme", "widget", 2024).await.unwrap();

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.year, 2024);
    assert_eq!(first.pull_requests.opened, 1);
}

#[tokio::test]
async fn different_years_are_cached_separately() {
    let fetcher = Arc::new(CountingFetcher::new(Outcome::Ok));
    let service = service(fetcher.clone());

    service.wrapped("acme", "widget", 2023).await.unwrap();
    service.wrapped("acme", "widget", 2024).await.unwrap();

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn blank_owner_is_rejected_before_fetching() {
    let fetcher = Arc::new(CountingFetcher::new(Outcome::Ok));
    let service = service(fetcher.clone());

    let err = service.wrapped(" ", "widget", 2024).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fetch_failures_are_not_cached() {
    let fetcher = Arc::new(CountingFetcher::new(Outcome::Unavailable));
    let service = service(fetcher.clone());

    let err = service.wrapped("acme", "widget", 2024).await.unwrap_err();
    assert!(matches!(err, AppError::Github(_)));
    service.wrapped("acme", "widget", 2024).await.unwrap_err();
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unknown_repository_is_not_found() {
    let fetcher = Arc::new(CountingFetcher::new(Outcome::Missing));
    let service = service(fetcher);

    let err = service.wrapped("acme", "ghost", 2024).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound("repository")));
}
