use qcsite_core::ServiceId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by {service} metrics endpoint (retry after {retry_after_secs}s)")]
    RateLimited {
        service: ServiceId,
        retry_after_secs: u64,
    },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("{service} fetch for {location} timed out after {timeout_ms}ms")]
    Timeout {
        service: ServiceId,
        location: String,
        timeout_ms: u64,
    },

    #[error("invalid provider base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("provider has been shut down")]
    ShutDown,
}

impl ProviderError {
    /// Whether a retry may succeed: rate limiting and transport failures.
    /// Status errors, bad bodies and shutdown are final.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Http(_))
    }
}
