use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, register_int_gauge,
    Histogram, HistogramVec, IntCounterVec, IntGauge,
};

pub static WRAPPED_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "wrapped_requests_total",
        "Wrapped summary requests grouped by cache outcome (hit, miss, error)",
        &["outcome"]
    )
    .expect("wrapped requests total")
});

pub static GITHUB_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "wrapped_github_requests_total",
        "GitHub API calls grouped by endpoint and outcome",
        &["endpoint", "outcome"]
    )
    .expect("github requests total")
});

pub static GITHUB_LATENCY_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "wrapped_github_latency_seconds",
        "Latency of GitHub API calls grouped by endpoint",
        &["endpoint"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]
    )
    .expect("github latency seconds")
});

pub static GITHUB_RETRIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "wrapped_github_retries_total",
        "GitHub calls repeated after a rate limit or transport failure",
        &["endpoint"]
    )
    .expect("github retries total")
});

pub static GITHUB_RATE_LIMIT_REMAINING: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "wrapped_github_rate_limit_remaining",
        "Last X-RateLimit-Remaining value reported by GitHub"
    )
    .expect("github rate limit remaining")
});

pub static STATS_RETRIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "wrapped_stats_retries_total",
        "Polls of a statistics endpoint that answered 202 Accepted",
        &["stat"]
    )
    .expect("stats retries total")
});

pub static ASSEMBLY_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "wrapped_assembly_seconds",
        "Time spent aggregating raw GitHub data into a wrapped summary",
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]
    )
    .expect("wrapped assembly seconds")
});

pub fn record_github_request(endpoint: &str, outcome: &str) {
    GITHUB_REQUESTS_TOTAL
        .with_label_values(&[endpoint, outcome])
        .inc();
}
