use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use http::{header, HeaderMap, StatusCode};
use reqwest::{Method, RequestBuilder};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::metrics;

const API_BASE: &str = "https://api.github.com/";
const LOW_RATE_LIMIT: i64 = 10;

#[derive(Debug, Error)]
pub enum GithubApiError {
    #[error("github api error: {status} for {endpoint}")]
    Http {
        status: StatusCode,
        endpoint: String,
    },
}

impl GithubApiError {
    pub fn status(status: StatusCode, endpoint: impl Into<String>) -> Self {
        Self::Http {
            status,
            endpoint: endpoint.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match *self {
            GithubApiError::Http { status, .. } => status,
        }
    }

    pub fn endpoint(&self) -> &str {
        match self {
            GithubApiError::Http { endpoint, .. } => endpoint.as_str(),
        }
    }

    /// First `GithubApiError` anywhere in an error chain.
    pub fn find(err: &anyhow::Error) -> Option<&GithubApiError> {
        err.chain().find_map(|cause| cause.downcast_ref::<GithubApiError>())
    }
}

/// The request never produced a response (connect, TLS or timeout failure).
#[derive(Debug, Error)]
#[error("transport error for {endpoint}")]
pub struct TransportError {
    pub endpoint: String,
    #[source]
    pub source: reqwest::Error,
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        self.source.is_timeout()
    }

    pub fn find(err: &anyhow::Error) -> Option<&TransportError> {
        err.chain().find_map(|cause| cause.downcast_ref::<TransportError>())
    }
}

/// A failed call worth repeating: rate limiting (403/429) or a dropped connection.
pub fn is_retryable(err: &anyhow::Error) -> bool {
    if TransportError::find(err).is_some() {
        return true;
    }
    GithubApiError::find(err).is_some_and(|api| {
        matches!(
            api.status_code(),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
        )
    })
}

fn rate_limit_remaining(headers: &HeaderMap) -> Option<i64> {
    headers
        .get("x-ratelimit-remaining")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<i64>().ok())
}

/// The statistics endpoints GitHub computes asynchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatsKind {
    Contributors,
    CommitActivity,
    CodeFrequency,
}

impl StatsKind {
    pub fn path(self) -> &'static str {
        match self {
            StatsKind::Contributors => "stats/contributors",
            StatsKind::CommitActivity => "stats/commit_activity",
            StatsKind::CodeFrequency => "stats/code_frequency",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatsKind::Contributors => "contributors",
            StatsKind::CommitActivity => "commit_activity",
            StatsKind::CodeFrequency => "code_frequency",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatsResponse {
    Ready(Value),
    /// 202 Accepted: GitHub is still computing the statistics.
    Computing,
}

#[async_trait]
pub trait GithubClient: Send + Sync {
    async fn get_repo(&self, owner: &str, repo: &str) -> Result<Value>;
    async fn list_contributors(&self, owner: &str, repo: &str, per_page: u32)
        -> Result<Vec<Value>>;
    async fn get_stats(&self, owner: &str, repo: &str, kind: StatsKind) -> Result<StatsResponse>;
    async fn get_languages(&self, owner: &str, repo: &str) -> Result<Value>;
    /// Newest first, PRs included.
    async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Value>>;
    /// Returns the `data` member of a successful GraphQL response.
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value>;
}

pub struct ReqwestGithubClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl ReqwestGithubClient {
    pub fn new(user_agent: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("building GitHub HTTP client")?;
        Ok(Self {
            http,
            base: Url::parse(API_BASE)?,
            token,
        })
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn repo_url(&self, owner: &str, repo: &str, suffix: &str) -> Result<Url> {
        let path = if suffix.is_empty() {
            format!("repos/{owner}/{repo}")
        } else {
            format!("repos/{owner}/{repo}/{suffix}")
        };
        Ok(self.base.join(&path)?)
    }

    fn with_query(url: &mut Url, params: &[(&str, String)]) {
        let mut query_pairs = url.query_pairs_mut();
        for (key, val) in params {
            query_pairs.append_pair(key, val);
        }
    }

    /// Sends the request and decodes the body. 202 and 204 carry no body and yield `Null`.
    #[instrument(skip(self, builder), fields(endpoint = label))]
    async fn execute(
        &self,
        builder: RequestBuilder,
        label: &'static str,
        path: &str,
    ) -> Result<(StatusCode, Value)> {
        let started = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(source) => {
                metrics::record_github_request(label, "transport_error");
                return Err(TransportError {
                    endpoint: path.to_string(),
                    source,
                }
                .into());
            }
        };
        metrics::GITHUB_LATENCY_SECONDS
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        if let Some(remaining) = rate_limit_remaining(response.headers()) {
            metrics::GITHUB_RATE_LIMIT_REMAINING.set(remaining);
            if remaining < LOW_RATE_LIMIT {
                warn!(endpoint = label, remaining, "GitHub rate limit nearly exhausted");
            }
        }

        let status = response.status();
        debug!(endpoint = label, path, status = status.as_u16(), "GitHub response");
        if !status.is_success() {
            metrics::record_github_request(label, "error");
            return Err(GithubApiError::status(status, path).into());
        }
        if status == StatusCode::ACCEPTED || status == StatusCode::NO_CONTENT {
            metrics::record_github_request(label, "empty");
            return Ok((status, Value::Null));
        }

        let body = response.bytes().await?;
        metrics::record_github_request(label, "success");
        if body.is_empty() {
            return Ok((status, Value::Null));
        }
        let value = serde_json::from_slice(&body)
            .with_context(|| format!("decoding response from {path}"))?;
        Ok((status, value))
    }

    async fn get_json(&self, url: Url, label: &'static str) -> Result<Value> {
        let path = url.path().trim_start_matches('/').to_string();
        let (_, value) = self
            .execute(self.request(Method::GET, url), label, &path)
            .await?;
        Ok(value)
    }

    async fn get_json_array(&self, url: Url, label: &'static str) -> Result<Vec<Value>> {
        match self.get_json(url, label).await? {
            Value::Array(items) => Ok(items),
            Value::Null => Ok(Vec::new()),
            _ => Err(anyhow!("expected array response from {label}")),
        }
    }
}

#[async_trait]
impl GithubClient for ReqwestGithubClient {
    async fn get_repo(&self, owner: &str, repo: &str) -> Result<Value> {
        let url = self.repo_url(owner, repo, "")?;
        self.get_json(url, "repo").await
    }

    async fn list_contributors(
        &self,
        owner: &str,
        repo: &str,
        per_page: u32,
    ) -> Result<Vec<Value>> {
        let mut url = self.repo_url(owner, repo, "contributors")?;
        Self::with_query(&mut url, &[("per_page", per_page.to_string())]);
        self.get_json_array(url, "contributors").await
    }

    async fn get_stats(&self, owner: &str, repo: &str, kind: StatsKind) -> Result<StatsResponse> {
        let url = self.repo_url(owner, repo, kind.path())?;
        let path = url.path().trim_start_matches('/').to_string();
        let (status, value) = self
            .execute(self.request(Method::GET, url), kind.as_str(), &path)
            .await?;
        if status == StatusCode::ACCEPTED {
            Ok(StatsResponse::Computing)
        } else {
            Ok(StatsResponse::Ready(value))
        }
    }

    async fn get_languages(&self, owner: &str, repo: &str) -> Result<Value> {
        let url = self.repo_url(owner, repo, "languages")?;
        self.get_json(url, "languages").await
    }

    async fn list_issues(
        &self,
        owner: &str,
        repo: &str,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<Value>> {
        let mut url = self.repo_url(owner, repo, "issues")?;
        let params = [
            ("state", "all".to_string()),
            ("sort", "created".to_string()),
            ("direction", "desc".to_string()),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        Self::with_query(&mut url, &params);
        self.get_json_array(url, "issues").await
    }

    async fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        let url = self.base.join("graphql")?;
        let payload = json!({
            "query": query,
            "variables": variables,
        });
        let builder = self.request(Method::POST, url).json(&payload);
        let (_, value) = self.execute(builder, "graphql", "graphql").await?;
        if let Some(errors) = value.get("errors").and_then(Value::as_array) {
            return Err(map_graphql_errors(errors));
        }
        value
            .get("data")
            .cloned()
            .ok_or_else(|| anyhow!("GraphQL response without data"))
    }
}

fn map_graphql_errors(errors: &[Value]) -> anyhow::Error {
    if let Some(first) = errors.first() {
        let message = first
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown GraphQL error");
        let error_type = first
            .get("type")
            .or_else(|| first.get("extensions").and_then(|ext| ext.get("code")))
            .and_then(Value::as_str)
            .unwrap_or("");
        if error_type == "RATE_LIMITED" || message.to_ascii_lowercase().contains("rate limit") {
            return GithubApiError::status(StatusCode::TOO_MANY_REQUESTS, "graphql").into();
        }
        return match error_type {
            "NOT_FOUND" => GithubApiError::status(StatusCode::NOT_FOUND, "graphql").into(),
            _ => anyhow!("GraphQL error: {message}"),
        };
    }
    anyhow!("unknown GraphQL error")
}
