use axum::{
    extract::{Query, State},
    Extension, Json,
};
use qcsite_core::Coordinates;
use qcsite_scoring::RecommendationTier;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{normalize_limit, ApiResponse, AppState};

const DEFAULT_MIN_SCORE: u8 = 60;

#[derive(Debug, Deserialize)]
pub(super) struct RecommendationsQuery {
    pub min_score: Option<u8>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct RecommendationItem {
    pub location: String,
    pub city: String,
    pub state: String,
    pub coordinates: Coordinates,
    pub warehouse_score: u8,
    pub recommendation_tier: RecommendationTier,
    pub market_share_percent: f64,
    pub competitor_count: u8,
    pub estimated_orders: u64,
    pub estimated_revenue: f64,
    pub summary: String,
}

/// Locations scoring at least `min_score`, best first.
pub(super) async fn list_recommendations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<RecommendationsQuery>,
) -> Json<ApiResponse<Vec<RecommendationItem>>> {
    let min_score = params.min_score.unwrap_or(DEFAULT_MIN_SCORE);
    let limit = normalize_limit(params.limit);

    let mut records: Vec<_> = state
        .scheduler
        .get_all()
        .into_iter()
        .filter(|r| r.result.warehouse_score >= min_score)
        .collect();
    records.sort_by(|a, b| {
        b.result
            .warehouse_score
            .cmp(&a.result.warehouse_score)
            .then_with(|| a.location.name.cmp(&b.location.name))
    });

    let data = records
        .into_iter()
        .take(limit)
        .map(|r| RecommendationItem {
            location: r.location.name.clone(),
            city: r.location.city.clone(),
            state: r.location.state.clone(),
            coordinates: r.location.coordinates,
            warehouse_score: r.result.warehouse_score,
            recommendation_tier: r.result.recommendation_tier,
            market_share_percent: r.result.market_share_percent,
            competitor_count: r.result.competitor_count,
            estimated_orders: r.own.estimated_orders(),
            estimated_revenue: r.estimated_revenue(),
            summary: r.summary.clone(),
        })
        .collect();

    Json(ApiResponse::new(data, req_id.0))
}
