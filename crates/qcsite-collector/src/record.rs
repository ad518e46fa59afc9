use chrono::{DateTime, Utc};
use qcsite_core::{Location, ProviderSnapshot};
use qcsite_scoring::SuitabilityResult;
use serde::Serialize;

/// Latest collected state for one location.
///
/// Immutable once built. The store replaces the whole record on each cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationRecord {
    pub location: Location,
    /// The operator's snapshot.
    pub own: ProviderSnapshot,
    /// Competitor snapshots in [`qcsite_core::ServiceId::COMPETITORS`] order.
    pub competitors: [ProviderSnapshot; 2],
    pub result: SuitabilityResult,
    /// Recommendation text for `result`.
    pub summary: String,
    pub collected_at: DateTime<Utc>,
}

impl LocationRecord {
    /// Number of snapshots in this record that are fetch-failure fallbacks.
    #[must_use]
    pub fn fallback_count(&self) -> usize {
        std::iter::once(&self.own)
            .chain(self.competitors.iter())
            .filter(|s| s.is_fallback())
            .count()
    }

    /// Operator revenue estimate: orders times average order value.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn estimated_revenue(&self) -> f64 {
        self.own.estimated_orders() as f64 * self.own.average_order_value()
    }
}
