use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use qcsite_core::{Location, ProviderSnapshot, ServiceId, SnapshotSource};
use reqwest::Client;

use crate::error::ProviderError;
use crate::normalize::normalize_metrics;
use crate::provider::MetricsProvider;
use crate::rate_limit::retry_with_backoff;
use crate::types::MetricsResponse;

/// Metrics provider backed by an HTTP metrics service.
///
/// Each fetch is `GET {base_url}/v1/{service}/metrics` with the location
/// passed as query parameters. 429 and network failures are retried with
/// exponential backoff up to `max_retries` additional attempts; 404 and
/// other non-2xx statuses are returned as typed errors.
pub struct HttpMetricsProvider {
    client: Client,
    base_url: reqwest::Url,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in seconds for exponential backoff: `backoff_base_secs * 2^attempt`.
    backoff_base_secs: u64,
    closed: AtomicBool,
}

impl HttpMetricsProvider {
    /// Creates a provider with the configured timeout, `User-Agent`, and
    /// retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidBaseUrl`] if `base_url` is not an
    /// absolute http(s) URL, or [`ProviderError::Http`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, ProviderError> {
        let base_url = parse_base_url(base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url,
            max_retries,
            backoff_base_secs,
            closed: AtomicBool::new(false),
        })
    }

    /// Builds the metrics URL for one `(location, service)` pair.
    fn metrics_url(&self, location: &Location, service: ServiceId) -> String {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v1", service.as_str(), "metrics"]);
        }
        url.query_pairs_mut()
            .append_pair("location", &location.name)
            .append_pair("city", &location.city)
            .append_pair("state", &location.state)
            .append_pair("lat", &location.coordinates.lat.to_string())
            .append_pair("lng", &location.coordinates.lng.to_string());
        url.to_string()
    }

    async fn fetch_once(
        &self,
        url: &str,
        location: &Location,
        service: ServiceId,
    ) -> Result<MetricsResponse, ProviderError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(ProviderError::RateLimited {
                service,
                retry_after_secs,
            });
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound {
                url: url.to_owned(),
            });
        }

        if !status.is_success() {
            return Err(ProviderError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<MetricsResponse>(&body).map_err(|e| ProviderError::Deserialize {
            context: format!("{service} metrics for {}", location.name),
            source: e,
        })
    }
}

#[async_trait]
impl MetricsProvider for HttpMetricsProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn fetch(
        &self,
        location: &Location,
        service: ServiceId,
    ) -> Result<ProviderSnapshot, ProviderError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ProviderError::ShutDown);
        }

        let url = self.metrics_url(location, service);
        let response = retry_with_backoff(self.max_retries, self.backoff_base_secs, || {
            self.fetch_once(&url, location, service)
        })
        .await?;

        Ok(normalize_metrics(
            service,
            response,
            SnapshotSource::Live,
            Utc::now(),
        ))
    }

    async fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::info!(base_url = %self.base_url, "http metrics provider shut down");
        }
    }
}

fn parse_base_url(base_url: &str) -> Result<reqwest::Url, ProviderError> {
    let invalid = |reason: &str| ProviderError::InvalidBaseUrl {
        base_url: base_url.to_owned(),
        reason: reason.to_owned(),
    };

    let url = reqwest::Url::parse(base_url).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot be used as a base"));
    }
    Ok(url)
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
