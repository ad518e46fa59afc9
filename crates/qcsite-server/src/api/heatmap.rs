//! Service-area heatmap for one location.
//!
//! The first point is the location itself, weighted by its warehouse score.
//! Each of the operator's service areas follows, placed on a fixed spiral
//! around the location so repeated requests draw the same map.

use std::f64::consts::TAU;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use qcsite_collector::LocationRecord;
use qcsite_core::ServiceArea;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

/// Farthest a service-area point is placed from the location, in degrees.
const SPREAD_DEG: f64 = 0.05;
/// Golden angle in radians; spreads points evenly without clustering.
const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;
/// Weighting of the location's own point.
const HEAD_COVERAGE_PERCENT: f64 = 100.0;
const HEAD_POPULATION: u64 = 100_000;

#[derive(Debug, Serialize, PartialEq)]
pub(super) struct HeatmapPoint {
    pub lat: f64,
    pub lng: f64,
    pub intensity: u8,
    pub area: HeatmapArea,
}

#[derive(Debug, Serialize, PartialEq)]
pub(super) struct HeatmapArea {
    pub name: String,
    pub city: String,
    pub total_orders: u64,
    pub coverage_percent: f64,
    pub population: u64,
}

/// `min(100, coverage * 0.6 + population / 1000 * 0.4)`, rounded.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn area_intensity(area: &ServiceArea) -> u8 {
    let raw = area.coverage_percent * 0.6 + area.population as f64 / 1000.0 * 0.4;
    raw.round().clamp(0.0, 100.0) as u8
}

/// Offset of the `index`-th of `count` points, in degrees of (lat, lng).
#[allow(clippy::cast_precision_loss)]
fn spiral_offset(index: usize, count: usize) -> (f64, f64) {
    let radius = SPREAD_DEG * ((index + 1) as f64 / count.max(1) as f64).sqrt();
    let angle = (index as f64 * GOLDEN_ANGLE) % TAU;
    (radius * angle.sin(), radius * angle.cos())
}

pub(super) fn heatmap_points(record: &LocationRecord) -> Vec<HeatmapPoint> {
    let location = &record.location;
    let origin = location.coordinates;
    let areas = record.own.service_areas();

    let head = HeatmapPoint {
        lat: origin.lat,
        lng: origin.lng,
        intensity: record.result.warehouse_score.min(100),
        area: HeatmapArea {
            name: location.name.clone(),
            city: location.city.clone(),
            total_orders: record.own.estimated_orders(),
            coverage_percent: HEAD_COVERAGE_PERCENT,
            population: HEAD_POPULATION,
        },
    };

    std::iter::once(head)
        .chain(areas.iter().enumerate().map(|(index, area)| {
            let (d_lat, d_lng) = spiral_offset(index, areas.len());
            HeatmapPoint {
                lat: origin.lat + d_lat,
                lng: origin.lng + d_lng,
                intensity: area_intensity(area),
                area: HeatmapArea {
                    name: area.name.clone(),
                    city: location.city.clone(),
                    total_orders: area.population / 100,
                    coverage_percent: area.coverage_percent,
                    population: area.population,
                },
            }
        }))
        .collect()
}

pub(super) async fn get_heatmap(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<Vec<HeatmapPoint>>>, ApiError> {
    let Some(record) = state.scheduler.get_by_name(&name) else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("no data collected for location {name}"),
        ));
    };

    Ok(Json(ApiResponse::new(heatmap_points(&record), req_id.0)))
}
