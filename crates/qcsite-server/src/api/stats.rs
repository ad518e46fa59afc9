use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use qcsite_collector::SchedulerStatus;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiResponse, AppState};

/// Operator totals across every tracked location.
#[derive(Debug, Serialize, PartialEq)]
pub(super) struct StatsData {
    pub tracked_locations: usize,
    pub total_orders: u64,
    pub summed_average_order_value: f64,
    /// Locations where the operator's service is available.
    pub active_areas: usize,
    pub average_market_share_percent: f64,
    pub last_updated: Option<DateTime<Utc>>,
}

#[allow(clippy::cast_precision_loss)]
pub(super) async fn get_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<StatsData>> {
    let records = state.scheduler.get_all();

    let total_orders = records
        .iter()
        .map(|r| r.own.estimated_orders())
        .fold(0u64, u64::saturating_add);
    let summed_average_order_value = records.iter().map(|r| r.own.average_order_value()).sum();
    let active_areas = records
        .iter()
        .filter(|r| r.own.service_available())
        .count();
    let average_market_share_percent = if records.is_empty() {
        0.0
    } else {
        records
            .iter()
            .map(|r| r.result.market_share_percent)
            .sum::<f64>()
            / records.len() as f64
    };
    let last_updated = records.iter().map(|r| r.collected_at).max();

    Json(ApiResponse::new(
        StatsData {
            tracked_locations: records.len(),
            total_orders,
            summed_average_order_value,
            active_areas,
            average_market_share_percent,
            last_updated,
        },
        req_id.0,
    ))
}

pub(super) async fn get_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<SchedulerStatus>> {
    Json(ApiResponse::new(state.scheduler.status().await, req_id.0))
}
