//! Retry and backoff for idempotent backend reads.
//!
//! Only `GET` requests go through here. Uploads are never retried: a
//! repeated capture could mark attendance twice.

use std::time::Duration;

/// Default number of retry attempts for transient network errors.
pub const DEFAULT_NETWORK_RETRIES: u32 = 3;

/// Base delay for exponential backoff.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Maximum delay cap for exponential backoff.
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(10);

/// Whether a reqwest error is worth another attempt.
///
/// Connection failures, timeouts and interrupted bodies are; so are the
/// gateway statuses a reverse proxy returns while the backend restarts.
pub fn is_transient_network_error(error: &reqwest::Error) -> bool {
    if error.is_connect() || error.is_timeout() || error.is_body() {
        return true;
    }

    matches!(error.status().map(|s| s.as_u16()), Some(502..=504))
}

/// Whether a response status is a transient gateway failure.
pub fn is_transient_status(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 502..=504)
}

/// Exponential backoff: `min(base * 2^attempt + base / 2, max)`.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    let exponential = base.saturating_mul(2u32.saturating_pow(attempt));
    exponential.saturating_add(base / 2).min(max)
}
