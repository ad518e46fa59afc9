//! The metrics-provider contract consumed by the collector.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use qcsite_core::{Location, ProviderSnapshot, ServiceId};

use crate::error::ProviderError;

/// Source of per-service metrics for a location.
///
/// Every call is independent: implementations keep no state between calls
/// that changes what a later call returns.
#[async_trait]
pub trait MetricsProvider: Send + Sync {
    /// Short name used in logs (`"http"`, `"simulated"`).
    fn name(&self) -> &'static str;

    /// Fetches one snapshot for `service` at `location`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] when the metrics cannot be obtained.
    async fn fetch(
        &self,
        location: &Location,
        service: ServiceId,
    ) -> Result<ProviderSnapshot, ProviderError>;

    /// Releases any resources the provider holds. Later fetches fail with
    /// [`ProviderError::ShutDown`].
    async fn shutdown(&self) {}
}

/// Fetches a snapshot, bounded by `timeout`, substituting
/// [`ProviderSnapshot::fallback`] on error or timeout.
///
/// A single provider outage therefore never blocks scoring for a location.
/// Failures are logged at `warn` and not returned.
pub async fn fetch_or_fallback(
    provider: &dyn MetricsProvider,
    location: &Location,
    service: ServiceId,
    timeout: Duration,
) -> ProviderSnapshot {
    let result = match tokio::time::timeout(timeout, provider.fetch(location, service)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            service,
            location: location.name.clone(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    };

    match result {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(
                provider = provider.name(),
                location = %location.name,
                service = %service,
                error = %e,
                "metrics fetch failed; using fallback snapshot"
            );
            ProviderSnapshot::fallback(service, Utc::now())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcsite_core::SnapshotSource;

    struct FailingProvider;

    #[async_trait]
    impl MetricsProvider for FailingProvider {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn fetch(
            &self,
            _location: &Location,
            _service: ServiceId,
        ) -> Result<ProviderSnapshot, ProviderError> {
            Err(ProviderError::UnexpectedStatus {
                status: 503,
                url: "http://metrics.test".to_string(),
            })
        }
    }

    struct HangingProvider;

    #[async_trait]
    impl MetricsProvider for HangingProvider {
        fn name(&self) -> &'static str {
            "hanging"
        }

        async fn fetch(
            &self,
            _location: &Location,
            _service: ServiceId,
        ) -> Result<ProviderSnapshot, ProviderError> {
            std::future::pending().await
        }
    }

    struct FixedProvider;

    #[async_trait]
    impl MetricsProvider for FixedProvider {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn fetch(
            &self,
            _location: &Location,
            service: ServiceId,
        ) -> Result<ProviderSnapshot, ProviderError> {
            Ok(ProviderSnapshot::new(
                service,
                true,
                321,
                250.0,
                18.0,
                SnapshotSource::Live,
                Utc::now(),
            ))
        }
    }

    fn nellore() -> Location {
        Location::new("Nellore", "Nellore", "Andhra Pradesh", 14.4426, 79.9865)
    }

    #[tokio::test]
    async fn error_is_replaced_by_fallback() {
        let snap = fetch_or_fallback(
            &FailingProvider,
            &nellore(),
            ServiceId::Zepto,
            Duration::from_secs(1),
        )
        .await;
        assert!(snap.is_fallback());
        assert_eq!(snap.service(), ServiceId::Zepto);
        assert!(!snap.service_available());
    }

    #[tokio::test]
    async fn hanging_call_is_bounded_by_timeout() {
        let snap = fetch_or_fallback(
            &HangingProvider,
            &nellore(),
            ServiceId::Blinkit,
            Duration::from_millis(20),
        )
        .await;
        assert!(snap.is_fallback());
    }

    #[tokio::test]
    async fn success_passes_through() {
        let snap = fetch_or_fallback(
            &FixedProvider,
            &nellore(),
            ServiceId::Swiggy,
            Duration::from_secs(1),
        )
        .await;
        assert!(!snap.is_fallback());
        assert_eq!(snap.estimated_orders(), 321);
    }
}
