//! Builds the configured metrics provider.

use std::sync::Arc;
use std::time::Duration;

use qcsite_core::{AppConfig, ProviderKind};

use crate::client::HttpMetricsProvider;
use crate::error::ProviderError;
use crate::provider::MetricsProvider;
use crate::simulated::SimulatedProvider;

/// Returns the provider selected by `config.provider`.
///
/// The simulated provider rotates, so each cycle draws new numbers, and is
/// seeded from `config.simulation_seed`, or a random seed when none is set.
///
/// # Errors
///
/// Returns [`ProviderError::InvalidBaseUrl`] or [`ProviderError::Http`] when
/// the HTTP provider cannot be constructed.
pub fn build_provider(config: &AppConfig) -> Result<Arc<dyn MetricsProvider>, ProviderError> {
    match &config.provider {
        ProviderKind::Simulated => {
            let seed = config.simulation_seed.unwrap_or_else(rand::random);
            tracing::info!(seed, "using simulated metrics provider");
            Ok(Arc::new(SimulatedProvider::rotating(seed)))
        }
        ProviderKind::Http { base_url } => {
            tracing::info!(base_url = %base_url, "using HTTP metrics provider");
            Ok(Arc::new(HttpMetricsProvider::new(
                base_url,
                config.provider_timeout_secs,
                &config.provider_user_agent,
                config.provider_max_retries,
                config.provider_retry_backoff_base_secs,
            )?))
        }
    }
}

/// Upper bound for one `(location, service)` call including retries: every
/// attempt's request timeout plus every backoff wait.
#[must_use]
pub fn call_budget(config: &AppConfig) -> Duration {
    let attempts = u64::from(config.provider_max_retries).saturating_add(1);
    let request_secs = config.provider_timeout_secs.saturating_mul(attempts);
    let backoff_secs = (0..config.provider_max_retries.min(62))
        .map(|n| config.provider_retry_backoff_base_secs.saturating_mul(1u64 << n))
        .fold(0u64, u64::saturating_add);
    Duration::from_secs(request_secs.saturating_add(backoff_secs))
}
