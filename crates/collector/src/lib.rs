pub mod backoff;
pub mod cache;
pub mod client;
pub mod fetcher;
pub mod metrics;
pub mod service;

pub use cache::{cache_key, LruWrappedCache, WrappedCache};
pub use client::{
    GithubApiError, GithubClient, ReqwestGithubClient, StatsKind, StatsResponse, TransportError,
};
pub use fetcher::{DataFetcher, GithubDataFetcher};
pub use service::WrappedService;
