//! Transient-failure retry policy shared by the provider clients.
//!
//! Rate-limit responses (429) and server-side failures (5xx) back off
//! exponentially with jitter; everything else fails immediately.

use crate::RetryConfig;
use std::time::Duration;
use tokio_retry2::RetryError;
use tokio_retry2::strategy::{ExponentialBackoff, jitter};

/// Wrap an error as retryable.
pub fn transient<E>(err: E) -> RetryError<E> {
    RetryError::Transient {
        err,
        retry_after: None,
    }
}

/// Wrap an error as final.
pub fn permanent<E>(err: E) -> RetryError<E> {
    RetryError::Permanent(err)
}

/// Whether a response status is worth retrying.
pub fn is_retryable(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Build the backoff schedule for a client from its retry configuration.
///
/// Delays double from `initial_backoff_ms` up to `max_delay_secs`, with
/// jitter. Disabled retry yields an empty schedule: the first failure is
/// final.
pub fn backoff(config: &RetryConfig) -> impl Iterator<Item = Duration> {
    let retries = if config.enabled {
        config.max_retries as usize
    } else {
        0
    };
    ExponentialBackoff::from_millis(config.initial_backoff_ms)
        .factor(2)
        .max_delay(Duration::from_secs(config.max_delay_secs))
        .map(jitter)
        .take(retries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_config_yields_no_delays() {
        let config = RetryConfig {
            enabled: false,
            ..RetryConfig::default()
        };
        assert_eq!(backoff(&config).count(), 0);
    }

    #[test]
    fn schedule_length_matches_max_retries() {
        let config = RetryConfig {
            max_retries: 5,
            ..RetryConfig::default()
        };
        assert_eq!(backoff(&config).count(), 5);
    }

    #[test]
    fn server_errors_are_retryable() {
        assert!(is_retryable(reqwest::StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable(reqwest::StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable(reqwest::StatusCode::BAD_REQUEST));
        assert!(!is_retryable(reqwest::StatusCode::UNAUTHORIZED));
    }
}
