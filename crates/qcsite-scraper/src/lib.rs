//! Metrics providers for qcsite.
//!
//! A [`MetricsProvider`] turns a `(location, service)` pair into a
//! [`qcsite_core::ProviderSnapshot`]. Two implementations ship here: the
//! HTTP-backed [`HttpMetricsProvider`] and the deterministic
//! [`SimulatedProvider`]. Callers normally go through
//! [`fetch_or_fallback`], which bounds every call with a timeout and
//! substitutes the fallback snapshot on failure.

pub mod client;
pub mod error;
pub mod factory;
pub mod normalize;
pub mod provider;
pub mod simulated;
pub mod types;

mod rate_limit;

pub use client::HttpMetricsProvider;
pub use error::ProviderError;
pub use factory::{build_provider, call_budget};
pub use normalize::normalize_metrics;
pub use provider::{fetch_or_fallback, MetricsProvider};
pub use simulated::SimulatedProvider;
pub use types::{MetricsResponse, WireServiceArea};
