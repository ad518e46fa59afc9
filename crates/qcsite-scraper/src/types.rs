//! Wire shapes returned by the metrics endpoint.
//!
//! Every field has an explicit default so partially populated responses
//! deserialize cleanly. A missing `service_available` means unavailable;
//! missing numbers mean zero. Numbers are signed on the wire so that bad
//! values reach normalization instead of failing the whole response.

use serde::Deserialize;

/// Body of `GET /v1/{service}/metrics`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MetricsResponse {
    pub service_available: bool,
    pub estimated_orders: i64,
    pub average_order_value: f64,
    #[serde(alias = "delivery_time")]
    pub delivery_time_minutes: f64,
    pub service_areas: Vec<WireServiceArea>,
    pub popular_categories: Vec<String>,
    pub peak_hours: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct WireServiceArea {
    pub name: String,
    #[serde(alias = "coverage")]
    pub coverage_percent: f64,
    pub population: i64,
}
