use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use collector::{GithubApiError, TransportError};
use common::AppError;
use serde::Serialize;
use tracing::warn;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unauthorized(String),
    RateLimited(String),
    Upstream(String),
    Timeout(String),
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    /// Maps the status GitHub answered with onto the status this API reports.
    fn from_github(err: &GithubApiError) -> Self {
        let message = format!("GitHub request to {} failed", err.endpoint());
        match err.status_code().as_u16() {
            404 => Self::NotFound("repository not found".to_string()),
            401 => Self::Unauthorized("GitHub rejected the configured token".to_string()),
            403 | 429 => Self::RateLimited("GitHub rate limit exceeded".to_string()),
            _ => Self::Upstream(message),
        }
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::InvalidInput(msg) => Self::BadRequest(msg),
            AppError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            AppError::Github(inner) => {
                warn!(error = ?inner, "GitHub fetch failed");
                if let Some(api) = GithubApiError::find(&inner) {
                    return Self::from_github(api);
                }
                match TransportError::find(&inner) {
                    Some(transport) if transport.is_timeout() => Self::Timeout(
                        "GitHub took too long to answer, try again later".to_string(),
                    ),
                    _ => Self::Upstream(inner.to_string()),
                }
            }
            AppError::Config(inner) => Self::Internal(inner.to_string()),
            AppError::Other(inner) => Self::Internal(inner.to_string()),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// `error` is a short title, `message` the human readable detail.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not Found", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad Request", msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "Unauthorized", msg),
            ApiError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, "Rate Limited", msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "Bad Gateway", msg),
            ApiError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, "Timeout", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Error", msg),
        };
        let body = Json(ErrorBody { error, message });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
