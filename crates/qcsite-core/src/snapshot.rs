//! Point-in-time metrics for one delivery service at one location.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Delivery time assigned to fallback snapshots. Slower than every
/// delivery-efficiency band, so a provider outage never earns points.
pub const FALLBACK_DELIVERY_MINUTES: f64 = 30.0;

/// The three delivery services compared at every location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceId {
    /// The operator evaluating warehouse placement.
    Blinkit,
    Zepto,
    Swiggy,
}

impl ServiceId {
    pub const OPERATOR: ServiceId = ServiceId::Blinkit;
    pub const COMPETITORS: [ServiceId; 2] = [ServiceId::Zepto, ServiceId::Swiggy];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceId::Blinkit => "blinkit",
            ServiceId::Zepto => "zepto",
            ServiceId::Swiggy => "swiggy",
        }
    }

    #[must_use]
    pub fn is_operator(self) -> bool {
        self == Self::OPERATOR
    }
}

impl std::fmt::Display for ServiceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a snapshot's numbers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotSource {
    Live,
    Simulated,
    /// Substituted after a failed or timed-out fetch.
    Fallback,
}

/// A sub-area served by a delivery service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceArea {
    pub name: String,
    /// Share of the sub-area covered, in `[0, 100]`.
    pub coverage_percent: f64,
    pub population: u64,
}

impl ServiceArea {
    /// Builds a sub-area, clamping coverage into `[0, 100]`.
    #[must_use]
    pub fn new(name: impl Into<String>, coverage_percent: f64, population: u64) -> Self {
        Self {
            name: name.into(),
            coverage_percent: clamp_non_negative(coverage_percent).min(100.0),
            population,
        }
    }
}

/// One provider's metrics for one location in one collection cycle.
///
/// Fields are private so the construction-time invariants hold for the
/// snapshot's whole life: every number is finite and non-negative, and an
/// unavailable service reports zero orders and zero order value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderSnapshot {
    service: ServiceId,
    service_available: bool,
    estimated_orders: u64,
    average_order_value: f64,
    delivery_time_minutes: f64,
    service_areas: Vec<ServiceArea>,
    popular_categories: Vec<String>,
    peak_hours: Vec<String>,
    source: SnapshotSource,
    captured_at: DateTime<Utc>,
}

impl ProviderSnapshot {
    /// Builds a snapshot, normalizing the numeric fields.
    ///
    /// Negative or non-finite values become `0`. When `service_available` is
    /// false, `estimated_orders` and `average_order_value` are forced to `0`.
    #[must_use]
    pub fn new(
        service: ServiceId,
        service_available: bool,
        estimated_orders: u64,
        average_order_value: f64,
        delivery_time_minutes: f64,
        source: SnapshotSource,
        captured_at: DateTime<Utc>,
    ) -> Self {
        let (estimated_orders, average_order_value) = if service_available {
            (estimated_orders, clamp_non_negative(average_order_value))
        } else {
            (0, 0.0)
        };

        Self {
            service,
            service_available,
            estimated_orders,
            average_order_value,
            delivery_time_minutes: clamp_non_negative(delivery_time_minutes),
            service_areas: Vec::new(),
            popular_categories: Vec::new(),
            peak_hours: Vec::new(),
            source,
            captured_at,
        }
    }

    /// The documented substitute for a failed fetch: service unavailable,
    /// no orders, no order value, no service areas.
    #[must_use]
    pub fn fallback(service: ServiceId, captured_at: DateTime<Utc>) -> Self {
        Self::new(
            service,
            false,
            0,
            0.0,
            FALLBACK_DELIVERY_MINUTES,
            SnapshotSource::Fallback,
            captured_at,
        )
    }

    #[must_use]
    pub fn with_service_areas(mut self, service_areas: Vec<ServiceArea>) -> Self {
        self.service_areas = service_areas;
        self
    }

    #[must_use]
    pub fn with_popular_categories(mut self, categories: Vec<String>) -> Self {
        self.popular_categories = categories;
        self
    }

    #[must_use]
    pub fn with_peak_hours(mut self, peak_hours: Vec<String>) -> Self {
        self.peak_hours = peak_hours;
        self
    }

    #[must_use]
    pub fn service(&self) -> ServiceId {
        self.service
    }

    #[must_use]
    pub fn service_available(&self) -> bool {
        self.service_available
    }

    #[must_use]
    pub fn estimated_orders(&self) -> u64 {
        self.estimated_orders
    }

    #[must_use]
    pub fn average_order_value(&self) -> f64 {
        self.average_order_value
    }

    #[must_use]
    pub fn delivery_time_minutes(&self) -> f64 {
        self.delivery_time_minutes
    }

    #[must_use]
    pub fn service_areas(&self) -> &[ServiceArea] {
        &self.service_areas
    }

    #[must_use]
    pub fn popular_categories(&self) -> &[String] {
        &self.popular_categories
    }

    #[must_use]
    pub fn peak_hours(&self) -> &[String] {
        &self.peak_hours
    }

    #[must_use]
    pub fn source(&self) -> SnapshotSource {
        self.source
    }

    #[must_use]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.source == SnapshotSource::Fallback
    }
}

fn clamp_non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}
