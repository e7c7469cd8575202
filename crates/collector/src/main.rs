use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{Datelike, Utc};
use clap::Parser;
use collector::{GithubDataFetcher, LruWrappedCache, ReqwestGithubClient, WrappedService};
use common::{config::AppConfig, logging};
use tracing::{info, warn};

/// Print the yearly wrapped summary of a GitHub repository as JSON.
#[derive(Debug, Parser)]
#[command(name = "collector", version)]
struct Cli {
    /// Repository owner (user or organization).
    owner: String,
    /// Repository name.
    repo: String,
    /// Calendar year, defaults to the current UTC year.
    year: Option<i32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging("info");
    let cli = Cli::parse();
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
    let service = WrappedService::new(fetcher, cache);

    let year = cli.year.unwrap_or_else(|| Utc::now().year());
    info!(owner = %cli.owner, repo = %cli.repo, year, "building wrapped summary");
    let wrapped = service.wrapped(&cli.owner, &cli.repo, year).await?;
    println!("{}", serde_json::to_string_pretty(wrapped.as_ref())?);
    Ok(())
}
