use std::time::Duration;

use common::config::FetchConfig;

/// `base * 2^attempt`, capped at `max`, then jittered by up to `jitter_frac` either way.
pub fn exponential_jitter_backoff(
    base: Duration,
    attempt: u32,
    max: Duration,
    jitter_frac: f32,
) -> Duration {
    let capped_attempt = attempt.min(8);
    let factor = 1u32 << capped_attempt;
    let raw = base.saturating_mul(factor);
    let capped = raw.min(max);
    let nanos = capped.as_nanos() as i128;
    let jitter = ((nanos as f64) * (jitter_frac as f64)).round() as i128;
    let delta = if jitter > 0 {
        fastrand::i128(-jitter..=jitter)
    } else {
        0
    };
    let result = (nanos + delta).max(0);
    Duration::from_nanos(result as u64)
}

/// Wait before re-polling a stats endpoint that answered 202, or before
/// retrying a rate-limited or dropped request.
pub fn retry_delay(config: &FetchConfig, attempt: u32) -> Duration {
    exponential_jitter_backoff(
        Duration::from_millis(config.retry_base_ms),
        attempt,
        Duration::from_millis(config.retry_max_ms),
        config.jitter_frac,
    )
}
