use std::sync::Arc;

use analysis::{assemble_wrapped, WrappedResult, YearWindow};
use chrono::Utc;
use common::errors::{AppError, Result};
use http::StatusCode;
use tracing::{info, instrument};

use crate::cache::{cache_key, WrappedCache};
use crate::client::GithubApiError;
use crate::fetcher::DataFetcher;
use crate::metrics;

/// Fetch, aggregate and cache wrapped summaries.
#[derive(Clone)]
pub struct WrappedService {
    fetcher: Arc<dyn DataFetcher>,
    cache: Arc<dyn WrappedCache>,
}

impl WrappedService {
    pub fn new(fetcher: Arc<dyn DataFetcher>, cache: Arc<dyn WrappedCache>) -> Self {
        Self { fetcher, cache }
    }

    #[instrument(skip(self))]
    pub async fn wrapped(&self, owner: &str, repo: &str, year: i32) -> Result<Arc<WrappedResult>> {
        let owner = owner.trim();
        let repo = repo.trim();
        if owner.is_empty() || repo.is_empty() {
            return Err(AppError::invalid("owner and repo are required"));
        }
        let window = YearWindow::for_year(year).map_err(|err| AppError::invalid(err.to_string()))?;

        let key = cache_key(owner, repo, year);
        if let Some(hit) = self.cache.get(&key).await {
            info!(%key, "wrapped cache hit");
            metrics::WRAPPED_REQUESTS_TOTAL
                .with_label_values(&["hit"])
                .inc();
            return Ok(hit);
        }
        info!(%key, "wrapped cache miss");

        let inputs = match self.fetcher.fetch_inputs(owner, repo, &window).await {
            Ok(inputs) => inputs,
            Err(err) => {
                metrics::WRAPPED_REQUESTS_TOTAL
                    .with_label_values(&["error"])
                    .inc();
                let missing = GithubApiError::find(&err)
                    .is_some_and(|api| api.status_code() == StatusCode::NOT_FOUND);
                if missing {
                    return Err(AppError::NotFound("repository"));
                }
                return Err(AppError::github(err));
            }
        };

        let timer = metrics::ASSEMBLY_SECONDS.start_timer();
        let result = tokio::task::spawn_blocking(move || {
            assemble_wrapped(&inputs, &window, Utc::now())
        })
        .await
        .map_err(|err| AppError::Other(anyhow::anyhow!("wrapped assembly task failed: {err}")))?;
        timer.observe_duration();

        let result = Arc::new(result);
        self.cache.put(key, result.clone()).await;
        metrics::WRAPPED_REQUESTS_TOTAL
            .with_label_values(&["miss"])
            .inc();
        Ok(result)
    }
}
