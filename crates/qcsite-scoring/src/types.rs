use serde::{Deserialize, Serialize};

use crate::tier::RecommendationTier;

/// Raw values that fed each scoring factor, kept for audit and display.
/// These are the inputs, not the points awarded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreFactors {
    /// Operator's estimated orders.
    pub order_volume: u64,
    pub market_share_percent: f64,
    /// Number of competitors with the service available.
    pub competitor_presence: u8,
    /// Operator's average order value.
    pub order_value: f64,
    /// Operator's delivery time in minutes.
    pub delivery_efficiency: f64,
}

/// Composite warehouse-suitability result for one location in one cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuitabilityResult {
    /// In `[0, 100]`.
    pub warehouse_score: u8,
    /// Operator share of combined orders, in `[0, 100]`. Zero when the
    /// market has no orders.
    pub market_share_percent: f64,
    pub total_market_orders: u64,
    /// In `0..=2`.
    pub competitor_count: u8,
    pub recommendation_tier: RecommendationTier,
    pub factors: ScoreFactors,
}
