//! Rate-limit detection and wait computation for GitHub API responses

use std::time::Duration;

use crate::config::{DEFAULT_RATE_LIMIT_WAIT, MIN_RATE_LIMIT_WAIT};
use crate::io::HttpResponse;

/// GitHub signals primary and secondary rate limits with 403 or 429
pub fn is_rate_limited(status: u16) -> bool {
    status == 429 || status == 403
}

/// How long to wait before repeating a rate-limited request
///
/// Uses `X-RateLimit-Reset` (epoch seconds) when present, then `Retry-After`
/// (seconds), then a fixed default. Never less than `MIN_RATE_LIMIT_WAIT`.
pub fn rate_limit_wait(response: &HttpResponse, now_epoch_secs: i64) -> Duration {
    let min_secs = MIN_RATE_LIMIT_WAIT.as_secs() as i64;

    let secs = if let Some(reset) = parse_header_int(response, "x-ratelimit-reset") {
        reset.saturating_sub(now_epoch_secs)
    } else if let Some(retry_after) = parse_header_int(response, "retry-after") {
        retry_after
    } else {
        DEFAULT_RATE_LIMIT_WAIT.as_secs() as i64
    };

    Duration::from_secs(secs.max(min_secs) as u64)
}

fn parse_header_int(response: &HttpResponse, name: &str) -> Option<i64> {
    response
        .header(name)
        .and_then(|value| value.trim().parse::<i64>().ok())
}
