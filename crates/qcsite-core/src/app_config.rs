use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which metrics provider backs the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderKind {
    /// Deterministic generated metrics, no network access.
    Simulated,
    /// Metrics fetched from an HTTP endpoint rooted at `base_url`.
    Http { base_url: String },
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Simulated => write!(f, "simulated"),
            ProviderKind::Http { .. } => write!(f, "http"),
        }
    }
}

/// Settings for the LLM-backed recommendation text. Present only when an
/// API key is configured.
#[derive(Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub url: String,
    pub model: String,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"[redacted]")
            .field("url", &self.url)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub locations_path: Option<PathBuf>,
    pub scraping_enabled: bool,
    pub scraping_interval_ms: u64,
    pub scraping_delay_ms: u64,
    pub provider: ProviderKind,
    pub provider_timeout_secs: u64,
    pub provider_user_agent: String,
    pub provider_max_retries: u32,
    pub provider_retry_backoff_base_secs: u64,
    pub simulation_seed: Option<u64>,
    pub llm: Option<LlmConfig>,
}
