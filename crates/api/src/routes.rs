use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Datelike, Utc};
use collector::WrappedService;
use prometheus::Encoder;
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<WrappedService>,
    pub metrics_path: &'static str,
}

pub fn build_router(state: Arc<ApiState>) -> Router {
    let metrics_path: &'static str = state.metrics_path;
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/github/wrapped", get(wrapped))
        .route(metrics_path, get(metrics))
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug, Deserialize)]
struct WrappedQuery {
    owner: Option<String>,
    repo: Option<String>,
    year: Option<String>,
}

#[instrument(skip(state))]
async fn wrapped(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<WrappedQuery>,
) -> ApiResult<Response> {
    let owner = required(query.owner, "owner")?;
    let repo = required(query.repo, "repo")?;
    let year = match query.year.as_deref().map(str::trim) {
        None | Some("") => Utc::now().year(),
        Some(value) => value
            .parse::<i32>()
            .map_err(|_| ApiError::bad_request(format!("invalid year: {value}")))?,
    };
    let result = state.service.wrapped(&owner, &repo, year).await?;
    Ok(Json(result.as_ref()).into_response())
}

fn required(value: Option<String>, name: &str) -> ApiResult<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ApiError::bad_request(format!("{name} is required"))),
    }
}

#[instrument(skip_all)]
async fn metrics() -> ApiResult<impl IntoResponse> {
    let encoder = prometheus::TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    let content_type = encoder.format_type().to_string();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok((
        axum::http::StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, content_type)],
        buffer,
    ))
}
