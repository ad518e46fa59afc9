//! Conversion from wire metrics into [`ProviderSnapshot`].

use chrono::{DateTime, Utc};
use qcsite_core::{ProviderSnapshot, ServiceArea, ServiceId, SnapshotSource};

use crate::types::{MetricsResponse, WireServiceArea};

/// Normalizes a raw [`MetricsResponse`] into a [`ProviderSnapshot`].
///
/// Negative counts become zero, coverage is clamped into `[0, 100]`, and
/// areas with a blank name are dropped. The unavailable-service invariant
/// is applied by [`ProviderSnapshot::new`].
#[must_use]
pub fn normalize_metrics(
    service: ServiceId,
    response: MetricsResponse,
    source: SnapshotSource,
    captured_at: DateTime<Utc>,
) -> ProviderSnapshot {
    let estimated_orders = u64::try_from(response.estimated_orders).unwrap_or(0);

    let service_areas = response
        .service_areas
        .into_iter()
        .filter_map(normalize_area)
        .collect();

    let popular_categories = response
        .popular_categories
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    ProviderSnapshot::new(
        service,
        response.service_available,
        estimated_orders,
        response.average_order_value,
        response.delivery_time_minutes,
        source,
        captured_at,
    )
    .with_service_areas(service_areas)
    .with_popular_categories(popular_categories)
    .with_peak_hours(response.peak_hours)
}

fn normalize_area(area: WireServiceArea) -> Option<ServiceArea> {
    let name = area.name.trim();
    if name.is_empty() {
        return None;
    }
    let population = u64::try_from(area.population).unwrap_or(0);
    Some(ServiceArea::new(name, area.coverage_percent, population))
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
