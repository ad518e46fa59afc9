//! Shared domain types and configuration for qcsite.
//!
//! Holds the candidate [`Location`] registry, the per-provider
//! [`ProviderSnapshot`] produced by metrics providers, and the
//! environment-driven [`AppConfig`].

pub mod app_config;
pub mod config;
pub mod locations;
pub mod snapshot;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, LlmConfig, ProviderKind};
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use locations::{default_locations, load_locations, Coordinates, Location, LocationRegistry};
pub use snapshot::{
    ProviderSnapshot, ServiceArea, ServiceId, SnapshotSource, FALLBACK_DELIVERY_MINUTES,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read locations file {path}: {source}")]
    LocationsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse locations file: {0}")]
    LocationsFileParse(#[from] serde_yaml::Error),

    #[error("locations validation failed: {0}")]
    Validation(String),
}
