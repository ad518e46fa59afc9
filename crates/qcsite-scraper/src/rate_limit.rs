//! Retry with exponential backoff for transient metrics-endpoint errors.

use std::future::Future;
use std::time::Duration;

use crate::error::ProviderError;

/// Wait before retry number `retry` (0-based): `base_secs * 2^retry`,
/// saturating.
pub(crate) fn backoff_delay(base_secs: u64, retry: u32) -> Duration {
    Duration::from_secs(base_secs.saturating_mul(1u64 << retry.min(62)))
}

/// Runs `fetch`, retrying transient failures (see
/// [`ProviderError::is_transient`]) at most `max_retries` more times.
///
/// Non-transient errors and the last transient error are returned as-is.
/// With `max_retries = 2` and `base_secs = 1` the worst case is three
/// attempts separated by 1 s and 2 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    base_secs: u64,
    mut fetch: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    for retry in 0..max_retries {
        match fetch().await {
            Err(err) if err.is_transient() => {
                let delay = backoff_delay(base_secs, retry);
                tracing::warn!(
                    retry = retry + 1,
                    max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient metrics error; backing off"
                );
                tokio::time::sleep(delay).await;
            }
            done => return done,
        }
    }
    fetch().await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use qcsite_core::ServiceId;
    use tokio::time::Instant;

    use super::*;

    fn rate_limited() -> ProviderError {
        ProviderError::RateLimited {
            service: ServiceId::Swiggy,
            retry_after_secs: 0,
        }
    }

    fn unavailable() -> ProviderError {
        ProviderError::UnexpectedStatus {
            status: 503,
            url: "http://metrics.test/v1/swiggy/metrics".to_owned(),
        }
    }

    #[test]
    fn delay_doubles_per_retry_and_saturates() {
        assert_eq!(backoff_delay(1, 0), Duration::from_secs(1));
        assert_eq!(backoff_delay(1, 2), Duration::from_secs(4));
        assert_eq!(backoff_delay(3, 1), Duration::from_secs(6));
        assert_eq!(backoff_delay(0, 5), Duration::ZERO);
        assert_eq!(backoff_delay(u64::MAX, 10), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn only_rate_limits_and_transport_failures_are_transient() {
        assert!(rate_limited().is_transient());
        for err in [
            unavailable(),
            ProviderError::NotFound {
                url: "http://metrics.test".to_owned(),
            },
            ProviderError::Timeout {
                service: ServiceId::Zepto,
                location: "Delhi".to_owned(),
                timeout_ms: 10,
            },
            ProviderError::ShutDown,
        ] {
            assert!(!err.is_transient(), "{err} must not be retried");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_is_surfaced_on_first_attempt() {
        let attempts = AtomicU32::new(0);
        let started = Instant::now();
        let result: Result<(), _> = retry_with_backoff(3, 1, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(unavailable()) }
        })
        .await;

        assert!(matches!(
            result,
            Err(ProviderError::UnexpectedStatus { status: 503, .. })
        ));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_backs_off_then_recovers() {
        let attempts = AtomicU32::new(0);
        let started = Instant::now();
        let result = retry_with_backoff(3, 1, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(rate_limited())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        // 1 s before the second attempt, 2 s before the third.
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_returns_the_last_rate_limit() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_backoff(2, 0, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(rate_limited()) }
        })
        .await;

        assert!(matches!(result, Err(ProviderError::RateLimited { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_retries_means_a_single_attempt() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = retry_with_backoff(0, 1, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(rate_limited()) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
