use std::sync::Arc;
use std::time::Duration;

use analysis::{WrappedInputs, YearWindow};
use anyhow::Result;
use api::{build_router, ApiState};
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{TimeZone, Utc};
use collector::{DataFetcher, GithubApiError, LruWrappedCache, WrappedService};
use normalizer::{Identity, RawRepository};
use serde_json::Value;
use tower::util::ServiceExt;

struct StubFetcher;

#[async_trait]
impl DataFetcher for StubFetcher {
    async fn fetch_inputs(
        &self,
        owner: &str,
        repo: &str,
        window: &YearWindow,
    ) -> Result<WrappedInputs> {
        let status = match repo {
            "missing" => Some(http::StatusCode::NOT_FOUND),
            "limited" => Some(http::StatusCode::FORBIDDEN),
            "broken" => Some(http::StatusCode::INTERNAL_SERVER_ERROR),
            _ => None,
        };
        if let Some(status) = status {
            return Err(GithubApiError::status(status, format!("repos/{owner}/{repo}")).into());
        }
        let at = Utc.with_ymd_and_hms(window.year(), 2, 1, 0, 0, 0).unwrap();
        Ok(WrappedInputs::empty(RawRepository {
            name: repo.to_string(),
            full_name: format!("{owner}/{repo}"),
            owner: Identity::new(owner, "https://avatars/acme.png"),
            description: Some("Widgets".into()),
            language: Some("Rust".into()),
            stars: 12,
            forks: 2,
            is_private: false,
            created_at: at,
            updated_at: at,
        }))
    }
}

fn app() -> Router {
    let cache = Arc::new(LruWrappedCache::new(16, Duration::from_secs(300)));
    let service = WrappedService::new(Arc::new(StubFetcher), cache);
    build_router(Arc::new(ApiState {
        service: Arc::new(service),
        metrics_path: "/metrics",
    }))
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let response = app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn wrapped_returns_camel_case_summary() {
    let (status, body) = get("/api/github/wrapped?owner=acme&repo=widget&year=2024").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["year"], 2024);
    assert_eq!(body["repo"]["fullName"], "acme/widget");
    assert_eq!(body["community"]["currentStars"], 12);
    assert_eq!(body["pullRequests"]["opened"], 0);
    assert!(body["generatedAt"].is_string());
    assert!(body["personality"]["type"].is_string());
}

#[tokio::test]
async fn year_defaults_to_current_year() {
    let (status, body) = get("/api/github/wrapped?owner=acme&repo=widget").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["year"], i64::from(chrono::Datelike::year(&Utc::now())));
}

#[tokio::test]
async fn missing_owner_or_repo_is_bad_request() {
    let (status, body) = get("/api/github/wrapped?repo=widget").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");
    assert_eq!(body["message"], "owner is required");

    let (status, _) = get("/api/github/wrapped?owner=acme&repo=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_year_is_bad_request() {
    let (status, body) = get("/api/github/wrapped?owner=acme&repo=widget&year=soon").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "invalid year: soon");
}

#[tokio::test]
async fn github_failures_map_to_api_statuses() {
    let (status, body) = get("/api/github/wrapped?owner=acme&repo=missing&year=2024").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not Found");
    assert_eq!(body["message"], "repository not found");

    let (status, body) = get("/api/github/wrapped?owner=acme&repo=limited&year=2024").await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Rate Limited");

    let (status, _) = get("/api/github/wrapped?owner=acme&repo=broken&year=2024").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn healthz_reports_ok() {
    let (status, body) = get("/healthz").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
