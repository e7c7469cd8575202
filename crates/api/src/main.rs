use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use api::{build_router, ApiState};
use axum::Router;
use collector::{GithubDataFetcher, LruWrappedCache, ReqwestGithubClient, WrappedService};
use common::{config::AppConfig, logging};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging("info");
    let config = AppConfig::load()?;

    let token = config
        .github
        .resolved_tokens()?
        .into_iter()
        .next()
        .map(|token| token.secret);
    if token.is_none() {
        warn!("no GitHub token configured, using unauthenticated rate limits");
    }
    let client = Arc::new(ReqwestGithubClient::new(
        &config.github.user_agent,
        token,
        Duration::from_secs(config.fetch.timeout_secs),
    )?);
    let fetcher = Arc::new(GithubDataFetcher::new(client, config.fetch.clone()));
    let cache = Arc::new(LruWrappedCache::new(
        config.cache.capacity,
        Duration::from_secs(config.cache.ttl_secs),
    ));

    let metrics_path: &'static str =
        Box::leak(config.observability.metrics_path.clone().into_boxed_str());
    let state = Arc::new(ApiState {
        service: Arc::new(WrappedService::new(fetcher, cache)),
        metrics_path,
    });
    let app: Router = build_router(state);

    let addr: std::net::SocketAddr = config.api.bind.parse()?;
    info!("api listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
