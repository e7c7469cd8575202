use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub github: GithubConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(".")
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Config::builder()
            .add_source(
                File::with_name(
                    path.as_ref()
                        .join("config/default")
                        .to_string_lossy()
                        .as_ref(),
                )
                .required(false),
            )
            .add_source(
                File::with_name(
                    path.as_ref()
                        .join("config/local")
                        .to_string_lossy()
                        .as_ref(),
                )
                .required(false),
            )
            .add_source(Environment::default().separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubToken {
    pub id: String,
    pub secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
    #[serde(default)]
    pub tokens: Vec<GithubToken>,
    pub user_agent: String,
}

impl GithubConfig {
    /// Configured tokens with blank secrets removed. Falls back to `GITHUB_TOKEN`
    /// when nothing usable is configured.
    pub fn resolved_tokens(&self) -> Result<Vec<GithubToken>, ConfigError> {
        let tokens: Vec<GithubToken> = self
            .tokens
            .iter()
            .filter(|token| !token.secret.trim().is_empty())
            .cloned()
            .collect();
        if !tokens.is_empty() {
            return Ok(tokens);
        }
        match std::env::var("GITHUB_TOKEN") {
            Ok(secret) if !secret.trim().is_empty() => Ok(vec![GithubToken {
                id: "env".to_string(),
                secret: secret.trim().to_string(),
            }]),
            _ => Ok(Vec::new()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "FetchConfig::default_stats_retries")]
    pub stats_retries: u32,
    #[serde(default = "FetchConfig::default_request_retries")]
    pub request_retries: u32,
    #[serde(default = "FetchConfig::default_retry_base_ms")]
    pub retry_base_ms: u64,
    #[serde(default = "FetchConfig::default_retry_max_ms")]
    pub retry_max_ms: u64,
    #[serde(default = "FetchConfig::default_jitter_frac")]
    pub jitter_frac: f32,
    #[serde(default = "FetchConfig::default_page_size")]
    pub page_size: u32,
    #[serde(default = "FetchConfig::default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "FetchConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl FetchConfig {
    const fn default_stats_retries() -> u32 {
        5
    }

    const fn default_request_retries() -> u32 {
        3
    }

    const fn default_retry_base_ms() -> u64 {
        2_000
    }

    const fn default_retry_max_ms() -> u64 {
        10_000
    }

    const fn default_jitter_frac() -> f32 {
        0.2
    }

    const fn default_page_size() -> u32 {
        100
    }

    const fn default_max_pages() -> u32 {
        10
    }

    const fn default_timeout_secs() -> u64 {
        30
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            stats_retries: Self::default_stats_retries(),
            request_retries: Self::default_request_retries(),
            retry_base_ms: Self::default_retry_base_ms(),
            retry_max_ms: Self::default_retry_max_ms(),
            jitter_frac: Self::default_jitter_frac(),
            page_size: Self::default_page_size(),
            max_pages: Self::default_max_pages(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "CacheConfig::default_capacity")]
    pub capacity: usize,
    #[serde(default = "CacheConfig::default_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    const fn default_capacity() -> usize {
        256
    }

    const fn default_ttl_secs() -> u64 {
        300
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: Self::default_capacity(),
            ttl_secs: Self::default_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub bind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "ObservabilityConfig::default_metrics_path")]
    pub metrics_path: String,
}

impl ObservabilityConfig {
    fn default_metrics_path() -> String {
        "/metrics".to_string()
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_path: Self::default_metrics_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_tokens_are_dropped() {
        let config = GithubConfig {
            tokens: vec![
                GithubToken {
                    id: "a".into(),
                    secret: "  ".into(),
                },
                GithubToken {
                    id: "b".into(),
                    secret: "ghp_x".into(),
                },
            ],
            user_agent: "repo-wrapped".into(),
        };
        let tokens = config.resolved_tokens().unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].id, "b");
    }

    #[test]
    fn fetch_defaults_match_stats_retry_policy() {
        let fetch = FetchConfig::default();
        assert_eq!(fetch.stats_retries, 5);
        assert_eq!(fetch.request_retries, 3);
        assert_eq!(fetch.retry_base_ms, 2_000);
        assert_eq!(CacheConfig::default().ttl_secs, 300);
    }
}
