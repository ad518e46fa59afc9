use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use qcsite_collector::LocationRecord;
use qcsite_core::{Coordinates, ProviderSnapshot};
use qcsite_scoring::RecommendationTier;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_collector_error, ApiError, ApiResponse, AppState};

const PENDING_RECOMMENDATION: &str = "Data collection in progress";

/// Registry entry enriched with the latest scored state, or zeros before the
/// first record exists.
#[derive(Debug, Serialize)]
pub(super) struct LocationSummaryItem {
    pub name: String,
    pub city: String,
    pub state: String,
    pub coordinates: Coordinates,
    pub warehouse_score: u8,
    pub recommendation_tier: Option<RecommendationTier>,
    pub market_share_percent: f64,
    pub competitor_count: u8,
    pub estimated_orders: u64,
    pub average_order_value: f64,
    pub recommendation: String,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(super) enum MarketPosition {
    Leader,
    Challenger,
}

#[derive(Debug, Serialize)]
pub(super) struct CompetitorAnalysis {
    pub location: String,
    pub own: ProviderSnapshot,
    pub competitors: [ProviderSnapshot; 2],
    pub market_share_percent: f64,
    pub competitor_count: u8,
    pub market_position: MarketPosition,
    pub operator_advantage: bool,
    pub competitive_gap: u8,
}

impl From<&LocationRecord> for CompetitorAnalysis {
    fn from(record: &LocationRecord) -> Self {
        let result = &record.result;
        Self {
            location: record.location.name.clone(),
            own: record.own.clone(),
            competitors: record.competitors.clone(),
            market_share_percent: result.market_share_percent,
            competitor_count: result.competitor_count,
            market_position: if result.market_share_percent > 50.0 {
                MarketPosition::Leader
            } else {
                MarketPosition::Challenger
            },
            operator_advantage: result.warehouse_score > 60,
            competitive_gap: 100u8.saturating_sub(result.warehouse_score),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct RefreshData {
    pub message: &'static str,
    pub record: LocationRecord,
}

pub(super) async fn list_locations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<LocationSummaryItem>>> {
    let scheduler = &state.scheduler;
    let data = scheduler
        .registry()
        .iter()
        .map(|location| {
            let record = scheduler.store().get(&location.name);
            let mut item = LocationSummaryItem {
                name: location.name.clone(),
                city: location.city.clone(),
                state: location.state.clone(),
                coordinates: location.coordinates,
                warehouse_score: 0,
                recommendation_tier: None,
                market_share_percent: 0.0,
                competitor_count: 0,
                estimated_orders: 0,
                average_order_value: 0.0,
                recommendation: PENDING_RECOMMENDATION.to_string(),
                last_updated: None,
            };
            if let Some(record) = record {
                item.warehouse_score = record.result.warehouse_score;
                item.recommendation_tier = Some(record.result.recommendation_tier);
                item.market_share_percent = record.result.market_share_percent;
                item.competitor_count = record.result.competitor_count;
                item.estimated_orders = record.own.estimated_orders();
                item.average_order_value = record.own.average_order_value();
                item.recommendation.clone_from(&record.summary);
                item.last_updated = Some(record.collected_at);
            }
            item
        })
        .collect();

    Json(ApiResponse::new(data, req_id.0))
}

/// Latest record for a location. A registered location without a record
/// yet is collected on demand.
pub(super) async fn get_location(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<LocationRecord>>, ApiError> {
    let record = match state.scheduler.get_by_name(&name) {
        Some(record) => record,
        None => state
            .scheduler
            .refresh_one(&name)
            .await
            .map_err(|e| map_collector_error(req_id.0.clone(), &e))?,
    };

    Ok(Json(ApiResponse::new(LocationRecord::clone(&record), req_id.0)))
}

pub(super) async fn refresh_location(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<RefreshData>>, ApiError> {
    let record = state
        .scheduler
        .refresh_one(&name)
        .await
        .map_err(|e| map_collector_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        RefreshData {
            message: "location refreshed",
            record: LocationRecord::clone(&record),
        },
        req_id.0,
    )))
}

pub(super) async fn get_competitors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<CompetitorAnalysis>>, ApiError> {
    let Some(record) = state.scheduler.get_by_name(&name) else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("no data collected for location {name}"),
        ));
    };

    Ok(Json(ApiResponse::new(
        CompetitorAnalysis::from(record.as_ref()),
        req_id.0,
    )))
}
